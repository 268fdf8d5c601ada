/// Persisted user preferences
///
/// The only durable state the application keeps: the selected output
/// format, stored as a small JSON file in the user's config directory:
/// - Linux: ~/.config/ai-photo-editor/prefs.json
/// - macOS: ~/Library/Application Support/ai-photo-editor/prefs.json
/// - Windows: %APPDATA%\ai-photo-editor\prefs.json
///
/// Loaded once at startup (missing or unreadable file falls back to
/// the PNG default) and written through a single setter on every
/// change.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use super::data::OutputFormat;

/// On-disk shape of the preference file
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
struct StoredPrefs {
    output_format: OutputFormat,
}

/// Handle to the preference file
#[derive(Debug, Clone)]
pub struct Preferences {
    path: PathBuf,
}

impl Preferences {
    /// Open the preference store at its default location.
    ///
    /// The parent directory is created if needed so later writes can
    /// succeed; failure to create it is not fatal, loads just fall
    /// back to defaults and saves report their error.
    pub fn new() -> Self {
        let path = Self::default_path();

        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                eprintln!("⚠️  Could not create config directory: {}", e);
            }
        }

        Preferences { path }
    }

    /// Open a preference store at an explicit path (tests)
    #[cfg(test)]
    pub fn with_path(path: PathBuf) -> Self {
        Preferences { path }
    }

    /// Get the path where the preference file should be stored
    fn default_path() -> PathBuf {
        let mut path = dirs::config_dir()
            .or_else(|| dirs::home_dir())
            .expect("Could not determine user config directory");

        path.push("ai-photo-editor");
        path.push("prefs.json");
        path
    }

    /// Read the stored output format, defaulting to PNG when the file
    /// is missing or unreadable
    pub fn load_output_format(&self) -> OutputFormat {
        let Ok(contents) = fs::read_to_string(&self.path) else {
            return OutputFormat::default();
        };

        match serde_json::from_str::<StoredPrefs>(&contents) {
            Ok(prefs) => prefs.output_format,
            Err(e) => {
                eprintln!("⚠️  Ignoring malformed preference file: {}", e);
                OutputFormat::default()
            }
        }
    }

    /// Write the output format preference to disk
    pub fn save_output_format(&self, format: OutputFormat) -> Result<(), String> {
        let prefs = StoredPrefs {
            output_format: format,
        };
        let json = serde_json::to_string_pretty(&prefs)
            .map_err(|e| format!("Failed to serialize preferences: {}", e))?;

        fs::write(&self.path, json)
            .map_err(|e| format!("Failed to write {}: {}", self.path.display(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_defaults_to_png() {
        let dir = TempDir::new().unwrap();
        let prefs = Preferences::with_path(dir.path().join("prefs.json"));
        assert_eq!(prefs.load_output_format(), OutputFormat::Png);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let prefs = Preferences::with_path(dir.path().join("prefs.json"));

        prefs.save_output_format(OutputFormat::Jpeg).unwrap();
        assert_eq!(prefs.load_output_format(), OutputFormat::Jpeg);

        prefs.save_output_format(OutputFormat::Png).unwrap();
        assert_eq!(prefs.load_output_format(), OutputFormat::Png);
    }

    #[test]
    fn test_malformed_file_defaults_to_png() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, "{not json").unwrap();

        let prefs = Preferences::with_path(path);
        assert_eq!(prefs.load_output_format(), OutputFormat::Png);
    }
}
