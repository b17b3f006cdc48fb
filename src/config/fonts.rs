//! Font sources installed on a new host.
use serde::Deserialize;

const NERD_FONTS: &str = "https://github.com/ryanoasis/nerd-fonts/releases/download/v2.3.3";
const P10K_MEDIA: &str = "https://github.com/romkatv/powerlevel10k-media/raw/master";

/// A zip archive of fonts, skipped when any of its families is installed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FontArchive {
    /// Download URL of the archive.
    pub url: String,
    /// Family names that indicate the archive is already installed.
    pub families: Vec<String>,
}

/// A single font file, skipped when a file of the same name is present in
/// the font directory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FontFile {
    /// Download URL of the font file.
    pub url: String,
}

impl FontFile {
    /// File name taken from the last URL path segment, percent-decoded.
    #[must_use]
    pub fn file_name(&self) -> String {
        let path = self.url.split(['?', '#']).next().unwrap_or_default();
        let last = path.rsplit('/').next().unwrap_or_default();
        percent_decode(last)
    }
}

/// The `[fonts]` section of `provision.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FontSources {
    /// Font archives.
    pub archives: Vec<FontArchive>,
    /// Individual font files.
    pub files: Vec<FontFile>,
}

impl Default for FontSources {
    fn default() -> Self {
        let archive = |name: &str, families: &[&str]| FontArchive {
            url: format!("{NERD_FONTS}/{name}.zip"),
            families: families.iter().map(ToString::to_string).collect(),
        };
        let file = |name: &str| FontFile {
            url: format!("{P10K_MEDIA}/{name}"),
        };
        Self {
            archives: vec![
                archive("FiraCode", &["firacode", "fira code"]),
                archive("RobotoMono", &["robotomono", "roboto mono"]),
                archive(
                    "SourceCodePro",
                    &["sourcecodepro", "source code pro", "saucecodepro"],
                ),
                archive("Hack", &["hack"]),
                archive("Meslo", &["meslolgs", "meslo lgs"]),
            ],
            files: vec![
                file("MesloLGS%20NF%20Regular.ttf"),
                file("MesloLGS%20NF%20Bold.ttf"),
                file("MesloLGS%20NF%20Italic.ttf"),
                file("MesloLGS%20NF%20Bold%20Italic.ttf"),
            ],
        }
    }
}

/// Decode `%XX` escapes; malformed escapes are kept verbatim.
fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while let Some(&b) = bytes.get(i) {
        if b == b'%'
            && let Some(hex) = s.get(i + 1..i + 3)
            && let Ok(decoded) = u8::from_str_radix(hex, 16)
        {
            out.push(decoded);
            i += 3;
        } else {
            out.push(b);
            i += 1;
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}
