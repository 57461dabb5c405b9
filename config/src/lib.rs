use once_cell::sync::Lazy;
use serde::Deserialize;

pub static CONFIG: Lazy<Config> = Lazy::new(Config::parse);

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default = "defaults::decoder")]
    pub decoder: DecoderConfig,
    #[serde(default = "defaults::output")]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize)]
pub struct DecoderConfig {
    #[serde(default = "defaults::bitness", deserialize_with = "bitness")]
    pub bitness: u32,
    /// Decode architecturally invalid encodings instead of rejecting them.
    #[serde(default)]
    pub no_invalid_check: bool,
    /// Follow AMD's interpretation of operand-size prefixed near branches.
    #[serde(default)]
    pub amd_branches: bool,
    /// Report `f3 90` as `nop` rather than `pause`.
    #[serde(default)]
    pub no_pause: bool,
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    /// Print the displacement and immediate offsets of each instruction.
    #[serde(default)]
    pub constant_offsets: bool,
    #[serde(default = "defaults::bytes_width")]
    pub bytes_width: usize,
    #[serde(default = "defaults::colored")]
    pub colored: bool,
}

/// Default values when one is missing in the config.yaml.
mod defaults {
    pub fn config() -> super::Config {
        super::Config {
            decoder: decoder(),
            output: output(),
        }
    }
    pub fn decoder() -> super::DecoderConfig {
        super::DecoderConfig {
            bitness: bitness(),
            no_invalid_check: false,
            amd_branches: false,
            no_pause: false,
        }
    }
    pub fn output() -> super::OutputConfig {
        super::OutputConfig {
            constant_offsets: false,
            bytes_width: bytes_width(),
            colored: colored(),
        }
    }

    pub fn bitness() -> u32 {
        64
    }
    pub fn bytes_width() -> usize {
        // 15 byte instruction, 3 characters per byte
        45
    }
    pub fn colored() -> bool {
        true
    }
}

impl Config {
    pub fn parse() -> Self {
        let path = match dirs::data_dir() {
            Some(mut dir) => {
                dir.push("xdis");
                dir.push("config.yaml");
                dir
            }
            None => {
                log::warn!("No data directory set, using the default config.");
                return defaults::config();
            }
        };

        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(_) => {
                log::trace!("No config at {}.", path.display());
                return defaults::config();
            }
        };

        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Self {
        if raw.trim().is_empty() {
            return defaults::config();
        }

        match serde_yaml::from_str(raw) {
            Ok(parsed) => parsed,
            Err(err) => {
                log::warning!("Failed to parse config.\nError: {err}.");

                // parse everything as default
                defaults::config()
            }
        }
    }
}

fn bitness<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let bitness = u32::deserialize(deserializer)?;
    match bitness {
        16 | 32 | 64 => Ok(bitness),
        _ => Err(serde::de::Error::custom(format!(
            "bitness must be 16, 32 or 64, not {bitness}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::Config;

    #[test]
    fn empty_is_default() {
        let config = Config::from_yaml("");
        assert_eq!(config.decoder.bitness, 64);
        assert!(!config.decoder.no_invalid_check);
        assert_eq!(config.output.bytes_width, 45);
    }

    #[test]
    fn partial_fields() {
        let config = Config::from_yaml("decoder:\n  bitness: 32\n  no_pause: true\n");
        assert_eq!(config.decoder.bitness, 32);
        assert!(config.decoder.no_pause);
        assert!(!config.decoder.amd_branches);
        assert!(config.output.colored);
    }

    #[test]
    fn bad_bitness_falls_back() {
        let config = Config::from_yaml("decoder:\n  bitness: 8\n");
        assert_eq!(config.decoder.bitness, 64);
    }
}
