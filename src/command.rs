//! Command-line construction: [`PrinceConfig`] → engine argument vector.
//!
//! The argument order is fixed. Option flags come in the order the engine's
//! own parser expects, and the free-form `options` string is always last so
//! it can override anything before it. Boolean settings only ever produce a
//! flag when they differ from the engine default.
//!
//! Arguments are kept as [`OsString`] and handed to the OS one by one, so
//! paths with spaces or non-UTF-8 bytes need no quoting.

use crate::config::PrinceConfig;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::Path;

/// Ordered argument vector for one engine invocation, program path first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    args: Vec<OsString>,
}

impl CommandLine {
    /// Start a command line with the engine executable.
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            args: vec![program.into()],
        }
    }

    pub fn push(&mut self, arg: impl Into<OsString>) {
        self.args.push(arg.into());
    }

    /// `--name=value`, where the value may be a non-UTF-8 path.
    pub fn push_pair(&mut self, name: &str, value: impl AsRef<OsStr>) {
        let mut arg = OsString::from(name);
        arg.push("=");
        arg.push(value);
        self.args.push(arg);
    }

    pub fn program(&self) -> &OsStr {
        &self.args[0]
    }

    /// Everything after the program path.
    pub fn arguments(&self) -> &[OsString] {
        &self.args[1..]
    }

    /// The full vector, program path included.
    pub fn as_slice(&self) -> &[OsString] {
        &self.args
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    /// Always false: a command line holds at least the program path.
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Lossy UTF-8 copy of every argument, handy for assertions and logs.
    pub fn to_strings(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }
}

const SECRET_FLAGS: [&str; 3] = ["--http-password=", "--user-password=", "--owner-password="];

/// Space-separated rendering for logs. Password values are masked.
impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            let arg = arg.to_string_lossy();
            match SECRET_FLAGS.iter().find(|flag| arg.starts_with(*flag)) {
                Some(flag) => write!(f, "{flag}***")?,
                None => f.write_str(&arg)?,
            }
        }
        Ok(())
    }
}

/// Build the engine command line for `config`.
///
/// Pure and deterministic: the same executable and config always yield the
/// same vector. Mode flags (`--server`, document paths…) are appended by the
/// driver afterwards.
pub fn build_command_line(exe_path: &Path, config: &PrinceConfig) -> CommandLine {
    let mut cmd = CommandLine::new(exe_path);

    for css in &config.style_sheets {
        cmd.push(format!("--style={css}"));
    }
    for js in &config.scripts {
        cmd.push(format!("--script={js}"));
    }

    if config.input_type != crate::config::InputType::Auto {
        cmd.push(format!("--input={}", config.input_type));
    }
    if let Some(ref url) = config.base_url {
        cmd.push(format!("--baseurl={url}"));
    }
    if let Some(ref root) = config.file_root {
        cmd.push(format!("--fileroot={root}"));
    }
    if config.javascript {
        cmd.push("--javascript");
    }
    if !config.xinclude {
        cmd.push("--no-xinclude");
    }

    if !config.network {
        cmd.push("--no-network");
    }
    if let Some(ref user) = config.http_username {
        cmd.push(format!("--http-user={user}"));
    }
    if let Some(ref password) = config.http_password {
        cmd.push(format!("--http-password={password}"));
    }
    if let Some(ref proxy) = config.http_proxy {
        cmd.push(format!("--http-proxy={proxy}"));
    }

    if let Some(ref log) = config.log_file {
        cmd.push_pair("--log", log);
    }
    if config.verbose {
        cmd.push("--verbose");
    }
    if config.debug {
        cmd.push("--debug");
    }

    if !config.embed_fonts {
        cmd.push("--no-embed-fonts");
    }
    if !config.subset_fonts {
        cmd.push("--no-subset-fonts");
    }
    if !config.compress {
        cmd.push("--no-compress");
    }

    if config.encrypt {
        let enc = &config.encryption;
        cmd.push("--encrypt");
        cmd.push(format!("--key-bits={}", enc.key_bits.bits()));
        if !enc.user_password.is_empty() {
            cmd.push(format!("--user-password={}", enc.user_password));
        }
        if !enc.owner_password.is_empty() {
            cmd.push(format!("--owner-password={}", enc.owner_password));
        }
        let perms = &enc.permissions;
        if perms.disallow_print {
            cmd.push("--disallow-print");
        }
        if perms.disallow_modify {
            cmd.push("--disallow-modify");
        }
        if perms.disallow_copy {
            cmd.push("--disallow-copy");
        }
        if perms.disallow_annotate {
            cmd.push("--disallow-annotate");
        }
    }

    if let Some(ref options) = config.options {
        cmd.push(options.as_str());
    }

    cmd
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{InputType, Permissions};
    use std::path::PathBuf;

    const EXE: &str = "/usr/bin/prince";

    fn args(config: &PrinceConfig) -> Vec<String> {
        build_command_line(Path::new(EXE), config).to_strings()
    }

    /// Options after the executable.
    fn flags(config: &PrinceConfig) -> Vec<String> {
        args(config).split_off(1)
    }

    #[test]
    fn default_config_is_just_the_executable() {
        assert_eq!(args(&PrinceConfig::default()), vec![EXE]);
    }

    #[test]
    fn each_boolean_toggle_adds_exactly_one_flag() {
        type Toggle = fn(&mut PrinceConfig, bool);
        // (setter, value that differs from the default, expected flag)
        let cases: [(Toggle, bool, &str); 8] = [
            (|c, v| c.javascript = v, true, "--javascript"),
            (|c, v| c.xinclude = v, false, "--no-xinclude"),
            (|c, v| c.network = v, false, "--no-network"),
            (|c, v| c.verbose = v, true, "--verbose"),
            (|c, v| c.debug = v, true, "--debug"),
            (|c, v| c.embed_fonts = v, false, "--no-embed-fonts"),
            (|c, v| c.subset_fonts = v, false, "--no-subset-fonts"),
            (|c, v| c.compress = v, false, "--no-compress"),
        ];

        for (set, non_default, flag) in cases {
            let mut c = PrinceConfig::default();
            set(&mut c, non_default);
            assert_eq!(flags(&c), vec![flag]);
            set(&mut c, !non_default);
            assert!(flags(&c).is_empty(), "{flag} should be gone again");
        }
    }

    #[test]
    fn toggling_back_removes_the_flag() {
        let mut c = PrinceConfig::default();
        c.set_compress(false);
        assert_eq!(flags(&c), vec!["--no-compress"]);
        c.set_compress(true);
        assert!(flags(&c).is_empty());
    }

    #[test]
    fn flags_are_independent_and_order_stable() {
        let mut c = PrinceConfig::default();
        c.set_debug(true).set_javascript(true).set_network(false);
        assert_eq!(flags(&c), vec!["--javascript", "--no-network", "--debug"]);
    }

    #[test]
    fn style_sheets_then_scripts_in_insertion_order() {
        let mut c = PrinceConfig::default();
        c.add_script("one.js")
            .add_style_sheet("b.css")
            .add_style_sheet("a.css")
            .add_script("two.js");
        assert_eq!(
            flags(&c),
            vec![
                "--style=b.css",
                "--style=a.css",
                "--script=one.js",
                "--script=two.js"
            ]
        );
    }

    #[test]
    fn input_type_only_when_not_auto() {
        let mut c = PrinceConfig::default();
        c.set_input_type(InputType::Auto);
        assert!(flags(&c).is_empty());
        c.set_html(true);
        assert_eq!(flags(&c), vec!["--input=html"]);
        c.set_input_type(InputType::Xml);
        assert_eq!(flags(&c), vec!["--input=xml"]);
    }

    #[test]
    fn optional_values_in_fixed_order() {
        let c = PrinceConfig::builder()
            .http_proxy("http://proxy:3128")
            .log_file("/tmp/prince.log")
            .http_password("pw")
            .base_url("http://example.com/")
            .http_username("bob")
            .file_root("/srv/www")
            .build()
            .unwrap();
        assert_eq!(
            flags(&c),
            vec![
                "--baseurl=http://example.com/",
                "--fileroot=/srv/www",
                "--http-user=bob",
                "--http-password=pw",
                "--http-proxy=http://proxy:3128",
                "--log=/tmp/prince.log",
            ]
        );
    }

    #[test]
    fn encryption_flags() {
        let mut c = PrinceConfig::default();
        c.set_encrypt(true);
        assert_eq!(flags(&c), vec!["--encrypt", "--key-bits=40"]);

        c.set_encrypt_info(
            128,
            "user",
            "",
            Permissions {
                disallow_print: true,
                disallow_annotate: true,
                ..Permissions::default()
            },
        )
        .unwrap();
        assert_eq!(
            flags(&c),
            vec![
                "--encrypt",
                "--key-bits=128",
                "--user-password=user",
                "--disallow-print",
                "--disallow-annotate",
            ]
        );
    }

    #[test]
    fn permissions_ignored_without_encryption() {
        let mut c = PrinceConfig::default();
        c.encryption.permissions.disallow_copy = true;
        c.encryption.owner_password = "owner".into();
        assert!(flags(&c).is_empty());
    }

    #[test]
    fn options_string_is_one_final_token() {
        let mut c = PrinceConfig::default();
        c.set_javascript(true)
            .set_options(Some("--media=screen --no-artificial-fonts".into()));
        assert_eq!(
            flags(&c),
            vec!["--javascript", "--media=screen --no-artificial-fonts"]
        );
    }

    #[test]
    fn log_path_with_spaces_is_one_argument() {
        let c = PrinceConfig::builder()
            .log_file(PathBuf::from("/var/log/my prince.log"))
            .build()
            .unwrap();
        assert_eq!(flags(&c), vec!["--log=/var/log/my prince.log"]);
    }

    #[test]
    fn display_masks_passwords() {
        let mut c = PrinceConfig::default();
        c.set_http_password("hunter2");
        c.set_encrypt_info(40, "alpha", "beta", Permissions::default())
            .unwrap();
        let shown = build_command_line(Path::new(EXE), &c).to_string();
        assert!(shown.starts_with(EXE));
        assert!(shown.contains("--http-password=***"), "got: {shown}");
        assert!(!shown.contains("hunter2"));
        assert!(!shown.contains("alpha"));
        assert!(!shown.contains("beta"));
    }

    #[test]
    fn program_and_arguments_split() {
        let mut c = PrinceConfig::default();
        c.set_verbose(true);
        let cmd = build_command_line(Path::new(EXE), &c);
        assert_eq!(cmd.program(), OsStr::new(EXE));
        assert_eq!(cmd.arguments(), &[OsString::from("--verbose")]);
        assert_eq!(cmd.len(), 2);
        assert!(!cmd.is_empty());
    }
}
