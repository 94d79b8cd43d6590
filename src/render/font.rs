use std::path::{Path, PathBuf};
use std::sync::Mutex;

use plotters::style::{FontStyle, register_font};

/// Family name every chart element asks for.
pub const FONT_FAMILY: &str = "sans-serif";

/// Common locations of a sans-serif TrueType font.
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

// The plotting library keeps registered fonts in a process-wide table.
static REGISTERED: Mutex<Option<PathBuf>> = Mutex::new(None);

/// Make a font available under [`FONT_FAMILY`]. Uses `explicit` when given,
/// otherwise the first system font found. Returns whether text can be drawn.
pub fn ensure_font(explicit: Option<&Path>) -> bool {
    let mut registered = match REGISTERED.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };

    let candidates: Vec<PathBuf> = match explicit {
        Some(path) => vec![path.to_path_buf()],
        None => {
            if registered.is_some() {
                return true;
            }
            SYSTEM_FONTS.iter().map(PathBuf::from).collect()
        }
    };

    for path in candidates {
        if registered.as_deref() == Some(path.as_path()) {
            return true;
        }
        match load(&path) {
            Ok(()) => {
                log::debug!("Registered font {}", path.display());
                *registered = Some(path);
                return true;
            }
            Err(e) if explicit.is_some() => {
                log::warn!("Cannot use font {}: {e}", path.display());
            }
            Err(_) => {}
        }
    }

    if registered.is_some() {
        return true;
    }
    log::warn!("No TrueType font found; the plot is drawn without text (pass --font to fix)");
    false
}

fn load(path: &Path) -> Result<(), String> {
    let bytes = std::fs::read(path).map_err(|e| e.to_string())?;
    // plotters keeps the font for the rest of the process.
    let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
    register_font(FONT_FAMILY, FontStyle::Normal, bytes).map_err(|_| "invalid font data".to_string())
}
