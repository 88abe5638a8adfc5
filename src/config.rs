//! Conversion options for the Prince engine.
//!
//! Every option the driver knows how to pass to the engine lives in
//! [`PrinceConfig`]. A config is built once, mutated freely between
//! conversions with the `set_*`/`add_*` methods, and reused: the driver only
//! borrows it while it builds the command line for one invocation.
//!
//! Defaults mirror the engine's own defaults, so a default config produces no
//! option flags at all: network access, XInclude, font embedding, font
//! subsetting and compression are on; everything else is off or empty.

use crate::error::PrinceError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// All options for a conversion.
///
/// Built via [`PrinceConfig::builder()`] or [`PrinceConfig::default()`] and
/// then adjusted with the setters.
///
/// # Example
/// ```rust
/// use prince_driver::{PrinceConfig, Permissions};
///
/// let mut config = PrinceConfig::builder()
///     .style_sheet("print.css")
///     .javascript(true)
///     .build()
///     .unwrap();
///
/// config.set_encrypt_info(128, "", "owner-secret", Permissions {
///     disallow_copy: true,
///     ..Permissions::default()
/// }).unwrap();
/// ```
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrinceConfig {
    // ── Input ────────────────────────────────────────────────────────────
    /// How documents are parsed. Default: [`InputType::Auto`].
    ///
    /// Auto-detection only works for named files with an `.html`/`.htm`
    /// extension; documents piped through stdin are treated as XML unless
    /// this is set to [`InputType::Html`].
    pub input_type: InputType,

    /// Base URL for resolving relative links, e.g. for streamed documents.
    pub base_url: Option<String>,

    /// Directory prepended to absolute filenames in the document.
    pub file_root: Option<String>,

    /// CSS style sheets applied to every document, in order.
    pub style_sheets: Vec<String>,

    /// JavaScript files run before conversion, in order.
    pub scripts: Vec<String>,

    /// Run scripts found in the document. Default: false.
    pub javascript: bool,

    /// Apply XInclude processing. Default: true.
    pub xinclude: bool,

    // ── Network ──────────────────────────────────────────────────────────
    /// Allow downloading HTTP resources. Default: true.
    pub network: bool,

    /// Username for HTTP basic authentication.
    pub http_username: Option<String>,

    /// Password for HTTP basic authentication.
    pub http_password: Option<String>,

    /// HTTP proxy URL.
    pub http_proxy: Option<String>,

    // ── Engine log ───────────────────────────────────────────────────────
    /// File the engine appends its own log to. The driver never reads it.
    pub log_file: Option<PathBuf>,

    /// Log informative messages. Default: false.
    pub verbose: bool,

    /// Log debug messages. Default: false.
    pub debug: bool,

    // ── PDF output ───────────────────────────────────────────────────────
    /// Embed fonts in the PDF. Default: true.
    pub embed_fonts: bool,

    /// Subset embedded fonts to the glyphs actually used. Default: true.
    pub subset_fonts: bool,

    /// Compress the PDF. Default: true.
    pub compress: bool,

    // ── Encryption ───────────────────────────────────────────────────────
    /// Encrypt the PDF using [`PrinceConfig::encryption`]. Default: false.
    pub encrypt: bool,

    /// Key size, passwords and permissions. Only used when `encrypt` is set.
    pub encryption: Encryption,

    // ── Misc ─────────────────────────────────────────────────────────────
    /// Extra command-line options, passed as one final argument so they can
    /// override anything before them.
    pub options: Option<String>,
}

impl Default for PrinceConfig {
    fn default() -> Self {
        Self {
            input_type: InputType::default(),
            base_url: None,
            file_root: None,
            style_sheets: Vec::new(),
            scripts: Vec::new(),
            javascript: false,
            xinclude: true,
            network: true,
            http_username: None,
            http_password: None,
            http_proxy: None,
            log_file: None,
            verbose: false,
            debug: false,
            embed_fonts: true,
            subset_fonts: true,
            compress: true,
            encrypt: false,
            encryption: Encryption::default(),
            options: None,
        }
    }
}

impl fmt::Debug for PrinceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrinceConfig")
            .field("input_type", &self.input_type)
            .field("base_url", &self.base_url)
            .field("file_root", &self.file_root)
            .field("style_sheets", &self.style_sheets)
            .field("scripts", &self.scripts)
            .field("javascript", &self.javascript)
            .field("xinclude", &self.xinclude)
            .field("network", &self.network)
            .field("http_username", &self.http_username)
            .field("http_password", &self.http_password.as_ref().map(|_| "<redacted>"))
            .field("http_proxy", &self.http_proxy)
            .field("log_file", &self.log_file)
            .field("verbose", &self.verbose)
            .field("debug", &self.debug)
            .field("embed_fonts", &self.embed_fonts)
            .field("subset_fonts", &self.subset_fonts)
            .field("compress", &self.compress)
            .field("encrypt", &self.encrypt)
            .field("encryption", &self.encryption)
            .field("options", &self.options)
            .finish()
    }
}

impl PrinceConfig {
    /// Create a new builder for `PrinceConfig`.
    pub fn builder() -> PrinceConfigBuilder {
        PrinceConfigBuilder {
            config: Self::default(),
            key_bits: None,
        }
    }

    /// Load a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, PrinceError> {
        serde_json::from_str(json).map_err(|e| PrinceError::InvalidConfig(e.to_string()))
    }

    pub fn add_style_sheet(&mut self, css_path: impl Into<String>) -> &mut Self {
        self.style_sheets.push(css_path.into());
        self
    }

    pub fn clear_style_sheets(&mut self) -> &mut Self {
        self.style_sheets.clear();
        self
    }

    pub fn add_script(&mut self, js_path: impl Into<String>) -> &mut Self {
        self.scripts.push(js_path.into());
        self
    }

    pub fn clear_scripts(&mut self) -> &mut Self {
        self.scripts.clear();
        self
    }

    /// Force every document to be parsed as HTML (`true`) or XML (`false`).
    pub fn set_html(&mut self, html: bool) -> &mut Self {
        self.input_type = if html { InputType::Html } else { InputType::Xml };
        self
    }

    pub fn set_input_type(&mut self, input_type: InputType) -> &mut Self {
        self.input_type = input_type;
        self
    }

    pub fn set_base_url(&mut self, url: impl Into<String>) -> &mut Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn set_file_root(&mut self, root: impl Into<String>) -> &mut Self {
        self.file_root = Some(root.into());
        self
    }

    pub fn set_javascript(&mut self, v: bool) -> &mut Self {
        self.javascript = v;
        self
    }

    pub fn set_xinclude(&mut self, v: bool) -> &mut Self {
        self.xinclude = v;
        self
    }

    pub fn set_network(&mut self, v: bool) -> &mut Self {
        self.network = v;
        self
    }

    pub fn set_http_username(&mut self, username: impl Into<String>) -> &mut Self {
        self.http_username = Some(username.into());
        self
    }

    pub fn set_http_password(&mut self, password: impl Into<String>) -> &mut Self {
        self.http_password = Some(password.into());
        self
    }

    pub fn set_http_proxy(&mut self, proxy: impl Into<String>) -> &mut Self {
        self.http_proxy = Some(proxy.into());
        self
    }

    /// Ask the engine to log to `path`, or stop it logging with `None`.
    pub fn set_log(&mut self, path: Option<PathBuf>) -> &mut Self {
        self.log_file = path;
        self
    }

    pub fn set_verbose(&mut self, v: bool) -> &mut Self {
        self.verbose = v;
        self
    }

    pub fn set_debug(&mut self, v: bool) -> &mut Self {
        self.debug = v;
        self
    }

    pub fn set_embed_fonts(&mut self, v: bool) -> &mut Self {
        self.embed_fonts = v;
        self
    }

    pub fn set_subset_fonts(&mut self, v: bool) -> &mut Self {
        self.subset_fonts = v;
        self
    }

    pub fn set_compress(&mut self, v: bool) -> &mut Self {
        self.compress = v;
        self
    }

    /// Turn encryption on or off, keeping the current key size, passwords
    /// and permissions (40 bits, no passwords, everything allowed by default).
    pub fn set_encrypt(&mut self, v: bool) -> &mut Self {
        self.encrypt = v;
        self
    }

    /// Set the encryption parameters and turn encryption on.
    ///
    /// # Errors
    /// [`PrinceError::InvalidKeyBits`] if `key_bits` is not 40 or 128. The
    /// config is left untouched in that case.
    pub fn set_encrypt_info(
        &mut self,
        key_bits: u32,
        user_password: impl Into<String>,
        owner_password: impl Into<String>,
        permissions: Permissions,
    ) -> Result<&mut Self, PrinceError> {
        let key_bits = KeyBits::try_from(key_bits)?;
        self.encrypt = true;
        self.encryption = Encryption {
            key_bits,
            user_password: user_password.into(),
            owner_password: owner_password.into(),
            permissions,
        };
        Ok(self)
    }

    /// Set extra command-line options, or clear them with `None`.
    pub fn set_options(&mut self, options: Option<String>) -> &mut Self {
        self.options = options;
        self
    }
}

/// Builder for [`PrinceConfig`].
#[derive(Debug)]
pub struct PrinceConfigBuilder {
    config: PrinceConfig,
    key_bits: Option<u32>,
}

impl PrinceConfigBuilder {
    pub fn style_sheet(mut self, css_path: impl Into<String>) -> Self {
        self.config.style_sheets.push(css_path.into());
        self
    }

    pub fn script(mut self, js_path: impl Into<String>) -> Self {
        self.config.scripts.push(js_path.into());
        self
    }

    pub fn input_type(mut self, input_type: InputType) -> Self {
        self.config.input_type = input_type;
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    pub fn file_root(mut self, root: impl Into<String>) -> Self {
        self.config.file_root = Some(root.into());
        self
    }

    pub fn javascript(mut self, v: bool) -> Self {
        self.config.javascript = v;
        self
    }

    pub fn xinclude(mut self, v: bool) -> Self {
        self.config.xinclude = v;
        self
    }

    pub fn network(mut self, v: bool) -> Self {
        self.config.network = v;
        self
    }

    pub fn http_username(mut self, username: impl Into<String>) -> Self {
        self.config.http_username = Some(username.into());
        self
    }

    pub fn http_password(mut self, password: impl Into<String>) -> Self {
        self.config.http_password = Some(password.into());
        self
    }

    pub fn http_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.config.http_proxy = Some(proxy.into());
        self
    }

    pub fn log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.log_file = Some(path.into());
        self
    }

    pub fn verbose(mut self, v: bool) -> Self {
        self.config.verbose = v;
        self
    }

    pub fn debug(mut self, v: bool) -> Self {
        self.config.debug = v;
        self
    }

    pub fn embed_fonts(mut self, v: bool) -> Self {
        self.config.embed_fonts = v;
        self
    }

    pub fn subset_fonts(mut self, v: bool) -> Self {
        self.config.subset_fonts = v;
        self
    }

    pub fn compress(mut self, v: bool) -> Self {
        self.config.compress = v;
        self
    }

    pub fn encrypt(mut self, v: bool) -> Self {
        self.config.encrypt = v;
        self
    }

    /// Set the encryption parameters and turn encryption on. The key size is
    /// checked by [`PrinceConfigBuilder::build`].
    pub fn encrypt_info(
        mut self,
        key_bits: u32,
        user_password: impl Into<String>,
        owner_password: impl Into<String>,
        permissions: Permissions,
    ) -> Self {
        self.key_bits = Some(key_bits);
        self.config.encrypt = true;
        self.config.encryption.user_password = user_password.into();
        self.config.encryption.owner_password = owner_password.into();
        self.config.encryption.permissions = permissions;
        self
    }

    pub fn options(mut self, options: impl Into<String>) -> Self {
        self.config.options = Some(options.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(mut self) -> Result<PrinceConfig, PrinceError> {
        if let Some(bits) = self.key_bits {
            self.config.encryption.key_bits = KeyBits::try_from(bits)?;
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How the engine should parse input documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    /// Guess from the filename extension and content. (default)
    #[default]
    Auto,
    Html,
    Xml,
}

impl InputType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputType::Auto => "auto",
            InputType::Html => "html",
            InputType::Xml => "xml",
        }
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InputType {
    type Err = PrinceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(InputType::Auto),
            "html" => Ok(InputType::Html),
            "xml" => Ok(InputType::Xml),
            other => Err(PrinceError::InvalidConfig(format!(
                "input type must be auto, html or xml, got '{other}'"
            ))),
        }
    }
}

/// PDF encryption key size. Only 40 and 128 bits are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum KeyBits {
    #[default]
    Bits40,
    Bits128,
}

impl KeyBits {
    pub fn bits(self) -> u32 {
        match self {
            KeyBits::Bits40 => 40,
            KeyBits::Bits128 => 128,
        }
    }
}

impl TryFrom<u32> for KeyBits {
    type Error = PrinceError;

    fn try_from(bits: u32) -> Result<Self, Self::Error> {
        match bits {
            40 => Ok(KeyBits::Bits40),
            128 => Ok(KeyBits::Bits128),
            bits => Err(PrinceError::InvalidKeyBits { bits }),
        }
    }
}

impl From<KeyBits> for u32 {
    fn from(k: KeyBits) -> u32 {
        k.bits()
    }
}

/// Encryption parameters, used when [`PrinceConfig::encrypt`] is set.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Encryption {
    pub key_bits: KeyBits,
    /// Empty means no user password.
    pub user_password: String,
    /// Empty means no owner password.
    pub owner_password: String,
    pub permissions: Permissions,
}

impl fmt::Debug for Encryption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |p: &str| if p.is_empty() { "" } else { "<redacted>" };
        f.debug_struct("Encryption")
            .field("key_bits", &self.key_bits)
            .field("user_password", &redact(&self.user_password))
            .field("owner_password", &redact(&self.owner_password))
            .field("permissions", &self.permissions)
            .finish()
    }
}

/// Operations denied to readers of an encrypted PDF. All allowed by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Permissions {
    pub disallow_print: bool,
    pub disallow_modify: bool,
    pub disallow_copy: bool,
    pub disallow_annotate: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_engine_defaults() {
        let c = PrinceConfig::default();
        assert_eq!(c.input_type, InputType::Auto);
        assert!(c.network);
        assert!(c.xinclude);
        assert!(c.embed_fonts && c.subset_fonts && c.compress);
        assert!(!c.javascript && !c.verbose && !c.debug && !c.encrypt);
        assert_eq!(c.encryption.key_bits, KeyBits::Bits40);
        assert!(c.encryption.user_password.is_empty());
        assert!(c.options.is_none());
    }

    #[test]
    fn set_encrypt_info_rejects_bad_key_bits() {
        let mut c = PrinceConfig::default();
        for bits in [0, 39, 41, 64, 127, 129, 256] {
            let err = c
                .set_encrypt_info(bits, "u", "o", Permissions::default())
                .unwrap_err();
            assert!(matches!(err, PrinceError::InvalidKeyBits { bits: b } if b == bits));
        }
        // Rejected calls leave the config alone.
        assert_eq!(c, PrinceConfig::default());
    }

    #[test]
    fn set_encrypt_info_enables_encryption() {
        let mut c = PrinceConfig::default();
        let perms = Permissions {
            disallow_print: true,
            ..Permissions::default()
        };
        c.set_encrypt_info(128, "user", "owner", perms).unwrap();
        assert!(c.encrypt);
        assert_eq!(c.encryption.key_bits, KeyBits::Bits128);
        assert_eq!(c.encryption.user_password, "user");
        assert_eq!(c.encryption.owner_password, "owner");
        assert!(c.encryption.permissions.disallow_print);
    }

    #[test]
    fn builder_validates_key_bits() {
        let err = PrinceConfig::builder()
            .encrypt_info(56, "", "", Permissions::default())
            .build()
            .unwrap_err();
        assert!(matches!(err, PrinceError::InvalidKeyBits { bits: 56 }));

        let c = PrinceConfig::builder()
            .encrypt_info(40, "", "", Permissions::default())
            .build()
            .unwrap();
        assert!(c.encrypt);
        assert_eq!(c.encryption.key_bits, KeyBits::Bits40);
    }

    #[test]
    fn set_html_picks_input_type() {
        let mut c = PrinceConfig::default();
        c.set_html(true);
        assert_eq!(c.input_type, InputType::Html);
        c.set_html(false);
        assert_eq!(c.input_type, InputType::Xml);
    }

    #[test]
    fn style_sheets_and_scripts_keep_order_and_clear() {
        let mut c = PrinceConfig::default();
        c.add_style_sheet("a.css").add_style_sheet("b.css");
        c.add_script("x.js");
        assert_eq!(c.style_sheets, vec!["a.css", "b.css"]);
        assert_eq!(c.scripts, vec!["x.js"]);
        c.clear_style_sheets().clear_scripts();
        assert!(c.style_sheets.is_empty());
        assert!(c.scripts.is_empty());
    }

    #[test]
    fn input_type_from_str() {
        assert_eq!("HTML".parse::<InputType>().unwrap(), InputType::Html);
        assert_eq!(" xml ".parse::<InputType>().unwrap(), InputType::Xml);
        assert_eq!("auto".parse::<InputType>().unwrap(), InputType::Auto);
        assert!("pdf".parse::<InputType>().is_err());
    }

    #[test]
    fn from_json_fills_defaults() {
        let c = PrinceConfig::from_json(r#"{"javascript": true, "input_type": "html"}"#).unwrap();
        assert!(c.javascript);
        assert_eq!(c.input_type, InputType::Html);
        assert!(c.network, "unspecified fields keep their defaults");
    }

    #[test]
    fn from_json_rejects_bad_key_bits() {
        let err = PrinceConfig::from_json(r#"{"encryption": {"key_bits": 64}}"#).unwrap_err();
        assert!(matches!(err, PrinceError::InvalidConfig(_)));

        let c = PrinceConfig::from_json(r#"{"encrypt": true, "encryption": {"key_bits": 128}}"#)
            .unwrap();
        assert_eq!(c.encryption.key_bits, KeyBits::Bits128);
    }

    #[test]
    fn debug_redacts_passwords() {
        let mut c = PrinceConfig::default();
        c.set_http_password("hunter2");
        c.set_encrypt_info(40, "alpha", "beta", Permissions::default())
            .unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("hunter2"), "got: {dbg}");
        assert!(!dbg.contains("alpha"), "got: {dbg}");
        assert!(!dbg.contains("beta"), "got: {dbg}");
    }
}
