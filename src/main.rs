use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use miette::{bail, IntoDiagnostic, Result};

use fox16::clock::ThrottledClock;
use fox16::disasm::disassemble;
use fox16::output::Output;
use fox16::{assemble, AssembleOptions, Assembly, OpcodeTable, Rom, VirtualMachine};

/// Name of the ROM written by the assembler and read by the virtual machine.
const ROM_FILE: &str = "fox16.bin";

/// Fox16 is an assembler and virtual machine for the Fox16 16-bit machine.
#[derive(Parser)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Quickly provide a `.fox16` or `.bin` file to run
    path: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Create binary ROM from a `.fox16` source file
    Assemble {
        /// `.fox16` file to assemble
        name: PathBuf,
        /// Destination to output the ROM
        dest: Option<PathBuf>,
        /// Drop unknown instructions and zero-fill undeclared labels instead of failing
        #[arg(short, long)]
        lenient: bool,
    },
    /// Check a `.fox16` file without outputting binary
    Check {
        /// File to check
        name: PathBuf,
    },
    /// Run a ROM until the machine halts
    Run {
        /// ROM to run
        #[arg(default_value = ROM_FILE)]
        name: PathBuf,
        /// Print every executed instruction
        #[arg(short, long)]
        trace: bool,
        /// Produce minimal output, suited for blackbox tests
        #[arg(short, long)]
        minimal: bool,
        /// Instructions per second, 0 to run unthrottled
        #[arg(short, long)]
        clock: Option<u64>,
    },
    /// Print a listing of the instructions inside a ROM
    Dump {
        /// ROM to list
        #[arg(default_value = ROM_FILE)]
        name: PathBuf,
    },
}

fn main() -> miette::Result<()> {
    use MsgColor::*;
    let args = Args::parse();
    fox16::env::init();
    Output::set_trace(fox16::env::is_trace_enabled());

    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new() //
                .context_lines(fox16::DIAGNOSTIC_CONTEXT_LINES)
                .build(),
        )
    }))?;

    if let Some(command) = args.command {
        match command {
            Command::Assemble {
                name,
                dest,
                lenient,
            } => {
                file_message(Green, "Assembling", &name);
                let asm = assemble_file(&name, lenient)?;

                let out_file_name = dest.unwrap_or_else(|| PathBuf::from(ROM_FILE));
                fs::write(&out_file_name, asm.rom.to_bytes()).into_diagnostic()?;

                let emitted = format!("emit binary ({} words)", asm.rom.len());
                message(Green, "Finished", emitted.as_str());
                file_message(Green, "Saved", &out_file_name);
                Ok(())
            }
            Command::Check { name } => {
                file_message(Green, "Checking", &name);
                let _ = assemble_file(&name, false)?;
                message(Green, "Success", "no errors found!");
                Ok(())
            }
            Command::Run {
                name,
                trace,
                minimal,
                clock,
            } => {
                if trace {
                    Output::set_trace(true);
                }
                Output::set_minimal(minimal);
                let rom = load_rom(&name)?;
                run(&name, rom.words(), clock)
            }
            Command::Dump { name } => {
                let rom = load_rom(&name)?;
                let table = OpcodeTable::new();
                for line in disassemble(rom.words(), &table) {
                    println!("{line}");
                }
                Ok(())
            }
        }
    } else if let Some(path) = args.path {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("fox16") => {
                file_message(Green, "Assembling", &path);
                let asm = assemble_file(&path, false)?;
                run(&path, asm.rom.words(), None)
            }
            Some("bin") => {
                let rom = load_rom(&path)?;
                run(&path, rom.words(), None)
            }
            Some(_) => bail!("File has unknown extension. Exiting..."),
            None => bail!("File has no extension. Exiting..."),
        }
    } else {
        println!("\n~ fox16 v{VERSION} ~");
        println!("{}", LOGO.truecolor(255, 140, 0).bold());
        println!("{SHORT_INFO}");
        Ok(())
    }
}

#[allow(unused)]
enum MsgColor {
    Green,
    Cyan,
    Red,
}

fn file_message(color: MsgColor, left: &str, right: &Path) {
    let right = format!("target {}", right.display());
    message(color, left, &right);
}

fn message<S>(color: MsgColor, left: S, right: S)
where
    S: Colorize + std::fmt::Display,
{
    let left = match color {
        MsgColor::Green => left.green(),
        MsgColor::Cyan => left.cyan(),
        MsgColor::Red => left.red(),
    };
    println!("{left:>12} {right}");
}

/// Read and assemble a `.fox16` source file.
fn assemble_file(name: &Path, lenient: bool) -> Result<Assembly> {
    if !name.exists() {
        bail!("File not found: {}", name.display());
    }
    if name.extension().and_then(|ext| ext.to_str()) != Some("fox16") {
        bail!("Invalid file extension: {}", name.display());
    }
    let contents = fs::read_to_string(name).into_diagnostic()?;
    assemble(&contents, &AssembleOptions { lenient })
}

fn load_rom(name: &Path) -> Result<Rom> {
    if !name.exists() {
        bail!("File not found: {}", name.display());
    }
    let bytes = fs::read(name).into_diagnostic()?;
    Rom::from_bytes(&bytes)
}

fn run(name: &Path, code: &[u16], clock: Option<u64>) -> Result<()> {
    let hz = clock
        .or_else(fox16::env::clock_hz)
        .unwrap_or(ThrottledClock::NOMINAL_HZ);
    let mut vm = VirtualMachine::with_rate(code, hz);

    message(MsgColor::Green, "Running", "emitted binary");
    let cycles = vm.run();

    Output::Normal.start_new_line();
    println!("{:>12} after {} cycles", "Halted".cyan(), cycles);
    if Output::is_trace() {
        Output::Diagnostic(fox16::output::Condition::Trace).print_registers(vm.processor());
    }
    file_message(MsgColor::Green, "Completed", name);
    Ok(())
}

const LOGO: &str = r#"
   ___           _  __
  / __\____ __ _/ |/ /_
 / _\/ _ \ \/ / | | '_ \
/ / | (_) >  <| | | (_) |
\/   \___/_/\_\_|_|\___/"#;

const SHORT_INFO: &str = r"
Welcome to fox16, an assembler and virtual machine for the Fox16 16-bit machine.
Please use `-h` or `--help` to access the usage instructions and documentation.
";

const VERSION: &str = env!("CARGO_PKG_VERSION");
