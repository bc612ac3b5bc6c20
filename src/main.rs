//! shadergen CLI entry point.
//!
//! Usage:
//!   shadergen -i=<file> -o=<dir>          # Compile all variants
//!   shadergen -i=<file> -h=<file>         # Generate the include header
//!   shadergen -i=<file> -o=<dir> -d -p    # Debug build with external symbols

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use shadergen::{
    CompilationOptions, Error, FxcBackend, Result, ShaderInfo, compile_shader, output,
};

/// Parsed command line.
#[derive(Debug)]
struct Arguments {
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    header: Option<PathBuf>,
    is_debug: bool,
    use_external_debug_symbols: bool,
    optimization_level: i32,
    compiler: PathBuf,
}

impl Default for Arguments {
    fn default() -> Self {
        Self {
            input: None,
            output: None,
            header: None,
            is_debug: false,
            use_external_debug_symbols: false,
            optimization_level: 3,
            compiler: PathBuf::from("fxc"),
        }
    }
}

impl Arguments {
    fn parse(args: impl Iterator<Item = String>) -> Result<Self> {
        let mut arguments = Self::default();
        for arg in args {
            if let Some(value) = arg.strip_prefix("-i=") {
                arguments.input = Some(PathBuf::from(value));
            } else if let Some(value) = arg.strip_prefix("-o=") {
                arguments.output = Some(PathBuf::from(value));
            } else if let Some(value) = arg.strip_prefix("-h=") {
                arguments.header = Some(PathBuf::from(value));
            } else if let Some(value) = arg.strip_prefix("-O=") {
                let level: i32 = value
                    .parse()
                    .map_err(|_| Error::InvalidArgument(arg.clone()))?;
                if !(-1..=3).contains(&level) {
                    return Err(Error::InvalidArgument(format!(
                        "optimization level {level} is outside -1..=3"
                    )));
                }
                arguments.optimization_level = level;
            } else if let Some(value) = arg.strip_prefix("-c=") {
                arguments.compiler = PathBuf::from(value);
            } else if arg == "-d" {
                arguments.is_debug = true;
            } else if arg == "-p" {
                arguments.use_external_debug_symbols = true;
            } else {
                return Err(Error::InvalidArgument(arg));
            }
        }
        Ok(arguments)
    }
}

fn print_usage() {
    println!("Shader Generator");
    println!();
    println!("Usage:");
    println!("  -i=<file_path>: Path of the source code");
    println!("  -o=<dir_path>: Path of the output directory");
    println!("  -h=<file_path>: Path of the include header");
    println!("  -d: Debug mode with debug symbols");
    println!("  -p: Save debug symbols as external files");
    println!("  -O=<level>: Optimization level, -1 to 3 (default 3)");
    println!("  -c=<file_path>: Compiler executable (default fxc)");
    println!();
    println!("Source file usage:");
    println!("  #pragma target cs_5_0 //Compilation target");
    println!("  #pragma entry main //Entry point - optional, default is 'main'");
    println!("  #pragma namespace MyApp::Shaders //Namespace for include header");
    println!("  #pragma option bool IsSomethingEnabled //A boolean option");
    println!("  #pragma option enum RenderMode {{X, Y, Z}} //An enum option");
    println!("  #pragma option int SampleCount {{1..4}} //An integer option");
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    match run() {
        Ok(code) => code,
        Err(error) => {
            log::error!("shader group compilation failed: {error}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        print_usage();
        return Ok(ExitCode::SUCCESS);
    }

    let arguments = Arguments::parse(args.into_iter())?;
    let Some(input) = &arguments.input else {
        return Err(Error::InvalidArgument(
            "an input file is required (-i=<file_path>)".into(),
        ));
    };

    let shader = ShaderInfo::from_file(input)?;

    if let Some(header) = &arguments.header {
        output::write_header(header, &shader)?;
        log::info!("wrote include header {}", header.display());
    }

    if let Some(dir) = &arguments.output {
        let options = CompilationOptions {
            is_debug: arguments.is_debug,
            use_external_debug_symbols: arguments.use_external_debug_symbols,
            optimization_level: arguments.optimization_level,
        };
        let backend = FxcBackend::new(&arguments.compiler);

        let compiled = compile_shader(&shader, &options, &backend);
        if compiled.is_empty() {
            return Ok(ExitCode::FAILURE);
        }

        let stem = input
            .file_stem()
            .map_or_else(|| "shaders".to_owned(), |s| s.to_string_lossy().into_owned());
        let path = output::write_shader_output(dir, &stem, &compiled)?;
        log::info!("wrote {} shader variants to {}", compiled.len(), path.display());
    }

    Ok(ExitCode::SUCCESS)
}
