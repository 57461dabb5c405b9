use std::io::{self, BufWriter, Write};

use args::ARGS;
use config::CONFIG;
use x86_64::{ConstantOffsets, DecoderOptions, Instruction, Stream};

mod binary;

use binary::Code;

fn options() -> DecoderOptions {
    let mut options = DecoderOptions::empty();
    options.set(
        DecoderOptions::NO_INVALID_CHECK,
        ARGS.no_invalid_check || CONFIG.decoder.no_invalid_check,
    );
    options.set(DecoderOptions::AMD_BRANCHES, CONFIG.decoder.amd_branches);
    options.set(DecoderOptions::NO_PAUSE, CONFIG.decoder.no_pause);
    options
}

fn fmt_offsets(offsets: &ConstantOffsets) -> String {
    let mut fmt = String::new();
    if offsets.has_displacement() {
        fmt += &format!(
            " disp@{}:{}",
            offsets.displacement_offset, offsets.displacement_size
        );
    }
    if offsets.has_immediate() {
        fmt += &format!(" imm@{}:{}", offsets.immediate_offset, offsets.immediate_size);
    }
    if offsets.has_immediate2() {
        fmt += &format!(
            " imm2@{}:{}",
            offsets.immediate_offset2, offsets.immediate_size2
        );
    }
    fmt
}

fn print_line<W: Write>(
    out: &mut W,
    stream: &Stream,
    instruction: &Instruction,
    show_offsets: bool,
) -> io::Result<()> {
    let bytes_width = CONFIG.output.bytes_width.max(6);
    let bytes = decoder::encode_hex_bytes_truncated(stream.encoding(), bytes_width);

    write!(out, "{:>12x}:  {bytes}{instruction}", instruction.ip())?;
    if show_offsets && !instruction.is_invalid() {
        let offsets = fmt_offsets(&stream.constant_offsets(instruction));
        if !offsets.is_empty() {
            write!(out, "  ;{offsets}")?;
        }
    }
    writeln!(out)
}

fn dump_log() {
    let logger = match log::LOGGER.lock() {
        Ok(logger) => logger,
        Err(poisoned) => poisoned.into_inner(),
    };

    let _ = logger.dump(&mut io::stderr(), CONFIG.output.colored);
}

fn main() {
    let path = match ARGS.path {
        Some(ref path) => path,
        None => log::error!("Missing path to an object."),
    };

    let binary = match std::fs::read(path) {
        Ok(binary) => binary,
        Err(err) => log::error!("Failed to read '{}': {err}.", path.display()),
    };

    let code = if ARGS.raw {
        Code::raw(&binary)
    } else {
        match Code::parse(&binary) {
            Ok(code) => code,
            Err(err) => {
                if ARGS.verbose {
                    dump_log();
                }
                log::error!("Failed to load '{}': {err}.", path.display())
            }
        }
    };

    let bitness = ARGS
        .bitness
        .or(code.bitness)
        .unwrap_or(CONFIG.decoder.bitness);
    let ip = ARGS.ip.unwrap_or(code.address);
    let show_offsets = ARGS.offsets || CONFIG.output.constant_offsets;

    let mut stream = match Stream::new(&code.bytes, bitness, ip, options()) {
        Ok(stream) => stream,
        Err(err) => log::error!("Can't decode {bitness}-bit code: {err}."),
    };

    log::notify!("Decoding {} bytes of {bitness}-bit code at {ip:#x}.", code.bytes.len());

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut invalid = 0usize;
    let mut decoded = 0usize;

    while let Some(instruction) = stream.next() {
        decoded += 1;
        if instruction.is_invalid() {
            invalid += 1;
            log::trace!(
                "Invalid encoding at {}: {}",
                decoder::encode_hex(instruction.ip() as i64),
                decoder::encode_hex_bytes(stream.encoding())
            );
        }

        // stdout was closed, e.g. piped into `head`
        if print_line(&mut out, &stream, &instruction, show_offsets).is_err() {
            break;
        }
    }

    let _ = out.flush();
    drop(out);

    if invalid > 0 {
        log::warn!("{invalid} of {decoded} instructions were invalid.");
    } else {
        log::notify!("Decoded {decoded} instructions.");
    }

    if ARGS.verbose {
        dump_log();
    }
}
