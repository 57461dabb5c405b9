use once_cell::sync::Lazy;
use std::path::PathBuf;

macro_rules! exit {
    ($code:expr => $($arg:tt)*) => {{
        eprintln!($($arg)*);
        std::process::exit($code);
    }};
}

const HELP: &str = "OVERVIEW: x86 / x86_64 instruction decoder

USAGE: xdis [options] <OBJECT>

OPTIONS:
  -H, --help               Print usage information
  -R, --raw                Treat the input as raw machine code instead of an object
  -b, --bitness <BITS>     Decode as 16, 32 or 64-bit code
  -I, --ip <ADDR>          Address of the first byte, in hex
  -N, --no-invalid-check   Accept architecturally invalid encodings
  -O, --offsets            Print displacement and immediate offsets
  -V, --verbose            Dump the log when finished";

const ABBRV: &[&str] = &["-H", "-R", "-b", "-I", "-N", "-O", "-V"];
const NAMES: &[&str] = &[
    "--help",
    "--raw",
    "--bitness",
    "--ip",
    "--no-invalid-check",
    "--offsets",
    "--verbose",
];

pub static ARGS: Lazy<Cli> = Lazy::new(Cli::parse);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cli {
    /// Decode the whole file as machine code.
    pub raw: bool,

    /// Overrides the configured or detected bitness.
    pub bitness: Option<u32>,

    /// Address of the first decoded byte.
    pub ip: Option<u64>,

    /// Don't reject architecturally invalid encodings.
    pub no_invalid_check: bool,

    /// Print constant offsets after each instruction.
    pub offsets: bool,

    /// Dump the log buffer on exit.
    pub verbose: bool,

    /// Path to object being decoded.
    pub path: Option<PathBuf>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ParseError {
    Help,
    Invalid(String),
}

impl Cli {
    pub fn parse() -> Self {
        match Self::parse_from(std::env::args().skip(1)) {
            Ok(cli) => cli,
            Err(ParseError::Help) => exit!(0 => "{HELP}"),
            Err(ParseError::Invalid(msg)) => exit!(1 => "{msg}"),
        }
    }

    pub fn parse_from<I: IntoIterator<Item = String>>(args: I) -> Result<Self, ParseError> {
        let mut cli = Cli::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-H" | "--help" => return Err(ParseError::Help),
                "-R" | "--raw" => cli.raw = true,
                "-N" | "--no-invalid-check" => cli.no_invalid_check = true,
                "-O" | "--offsets" => cli.offsets = true,
                "-V" | "--verbose" => cli.verbose = true,
                "-b" | "--bitness" => {
                    let value = args.next().unwrap_or_default();
                    match value.parse::<u32>() {
                        Ok(bits @ (16 | 32 | 64)) => cli.bitness = Some(bits),
                        _ => {
                            return Err(ParseError::Invalid(format!(
                                "Bitness must be 16, 32 or 64, not '{value}'."
                            )))
                        }
                    }
                }
                "-I" | "--ip" => {
                    let value = args.next().unwrap_or_default();
                    let digits = value.trim_start_matches("0x");
                    match u64::from_str_radix(digits, 16) {
                        Ok(ip) => cli.ip = Some(ip),
                        Err(_) => {
                            return Err(ParseError::Invalid(format!(
                                "Invalid hex address '{value}'."
                            )))
                        }
                    }
                }
                path if !path.starts_with('-') => {
                    if cli.path.is_some() {
                        return Err(ParseError::Invalid(format!(
                            "Unexpected second object '{path}'."
                        )));
                    }
                    cli.path = Some(PathBuf::from(path));
                }
                unknown => return Err(ParseError::Invalid(suggest(unknown))),
            }
        }

        cli.validate_args()?;
        Ok(cli)
    }

    fn validate_args(&self) -> Result<(), ParseError> {
        if self.path.is_none() {
            return Err(ParseError::Invalid(format!(
                "Missing path to an object.\n\n{HELP}"
            )));
        }

        Ok(())
    }
}

fn suggest(unknown: &str) -> String {
    let mut distance = u32::MAX;
    let mut best_guess = "";
    for name in NAMES.iter().chain(ABBRV) {
        let d = triple_accel::levenshtein_exp(unknown.as_bytes(), name.as_bytes());
        if d < distance {
            distance = d;
            best_guess = *name;
        }
    }

    // A guess that's less than 4 `steps` away from a correct arg.
    if distance < 4 {
        format!("Unknown cmd arg '{unknown}' did you mean '{best_guess}'?")
    } else {
        format!("Unknown cmd arg '{unknown}' was entered.")
    }
}
