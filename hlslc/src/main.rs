//! HLSL offline translator command line tool.
//!
//! Options apply to the next input file and reset afterwards, so several
//! translations can be chained in one invocation:
//!
//! ```text
//! hlslc -entry VS -target vertex Example.hlsl -entry PS -target fragment Example.hlsl
//! ```

use hlslc_core::{
    Options, OutputVersion, ShaderInput, ShaderOutput, ShaderTarget, StdLog, translate,
};
use log::{error, info};
use std::fs;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

const VERSION_STRING: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Error)]
enum DriverError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("missing next argument after flag \"{0}\"")]
    MissingArgument(String),

    #[error("{0}")]
    InvalidArgument(String),
}

/// Per-file translation state; reset after each input file.
#[derive(Default)]
struct Config {
    entry: String,
    target: String,
    shader_in: String,
    shader_out: String,
    output: String,
    predefined_macros: Vec<(String, Option<String>)>,
    options: Options,
}

impl Config {
    fn new() -> Self {
        Config {
            shader_in: "HLSL5".to_string(),
            shader_out: "GLSL330".to_string(),
            ..Config::default()
        }
    }

    /// Reset the per-file settings, keeping formatting options and macros.
    fn reset_per_file(&mut self) {
        self.entry.clear();
        self.target.clear();
        self.output.clear();
    }
}

fn print_help() {
    let lines = [
        "Usage:",
        "  hlslc (OPTION+ FILE)+",
        "Options:",
        "  -entry ENTRY ........... HLSL shader entry point",
        "  -target TARGET ......... Shader target; valid values:",
        "    vertex, fragment, geometry, tess-control, tess-evaluation, compute",
        "  -shaderin VERSION ...... HLSL version; default is HLSL5; valid values:",
        "    HLSL3, HLSL4, HLSL5",
        "  -shaderout VERSION ..... GLSL version; default is GLSL330; valid values:",
        "    GLSL110, GLSL120, GLSL130, GLSL140, GLSL150, GLSL330,",
        "    GLSL400, GLSL410, GLSL420, GLSL430, GLSL440, GLSL450",
        "  -indent INDENT ......... Code indentation string; by default 4 spaces",
        "  -prefix PREFIX ......... Prefix for local variables (use \"<none>\" to disable); by default '_'",
        "  -output FILE ........... GLSL output file; default is '<FILE>.<TARGET>.glsl'",
        "  -warn [on|off] ......... Enables/disables all warnings; by default off",
        "  -blanks [on|off] ....... Enables/disables blank lines between declarations; by default on",
        "  -line-marks [on|off] ... Enables/disables line marks (e.g. '#line 30'); by default off",
        "  -dump-ast [on|off] ..... Enables/disables debug output of the abstract syntax tree; by default off",
        "  -pponly [on|off] ....... Enables/disables to only preprocess source code; by default off",
        "  -comments [on|off] ..... Enables/disables commentaries kept from the sources; by default on",
        "  -D<IDENT> .............. Adds the identifier <IDENT> to the pre-defined macros",
        "  -D<IDENT>=VALUE ........ Adds the identifier <IDENT> with the VALUE",
        "  --help, help, -h ....... Prints this help reference",
        "  --version, -v .......... Prints the version information",
        "  --pause ................ Waits for user input after the translation process",
        "Example:",
        "  hlslc -entry VS -target vertex Example.hlsl -entry PS -target fragment Example.hlsl",
        "   --> Example.vertex.glsl; Example.fragment.glsl",
    ];
    for line in lines {
        println!("{}", line);
    }
}

fn print_version() {
    println!("HLSL to GLSL translator ( Version {} )", VERSION_STRING);
    println!("3-Clause BSD License");
}

fn next_arg(args: &[String], index: &mut usize, flag: &str) -> Result<String, DriverError> {
    *index += 1;
    args.get(*index)
        .cloned()
        .ok_or_else(|| DriverError::MissingArgument(flag.to_string()))
}

/// Boolean flags default to `on` when used; an explicit `on`/`off` in
/// the next argument is consumed.
fn bool_arg(args: &[String], index: &mut usize) -> bool {
    match args.get(*index + 1).map(|s| s.as_str()) {
        Some("on") => {
            *index += 1;
            true
        }
        Some("off") => {
            *index += 1;
            false
        }
        _ => true,
    }
}

fn predefined_macro_arg(arg: &str) -> (String, Option<String>) {
    let body = &arg[2..];
    match body.split_once('=') {
        Some((ident, value)) if !value.is_empty() => {
            (ident.to_string(), Some(value.to_string()))
        }
        _ => (body.to_string(), None),
    }
}

fn default_output_name(filename: &str, target: &str) -> String {
    let stem = Path::new(filename)
        .with_extension("")
        .to_string_lossy()
        .into_owned();
    if target.is_empty() {
        format!("{}.glsl", stem)
    } else {
        format!("{}.{}.glsl", stem, target)
    }
}

fn translate_file(config: &mut Config, filename: &str) -> Result<bool, DriverError> {
    if config.entry.is_empty() || config.target.is_empty() {
        return Err(DriverError::InvalidArgument(format!(
            "no entry point or shader target specified for \"{}\"",
            filename
        )));
    }

    let target: ShaderTarget = config
        .target
        .parse()
        .map_err(DriverError::InvalidArgument)?;
    let input_version = config
        .shader_in
        .parse()
        .map_err(DriverError::InvalidArgument)?;
    let output_version: OutputVersion = config
        .shader_out
        .parse()
        .map_err(DriverError::InvalidArgument)?;

    if config.output.is_empty() {
        config.output = default_output_name(filename, &config.target);
    }
    if config.options.prefix == "<none>" {
        config.options.prefix.clear();
    }

    let source = fs::read_to_string(filename)?;

    let mut input = ShaderInput::new(source, config.entry.clone(), target);
    input.filename = filename.to_string();
    input.input_version = input_version;
    input.predefined_macros = config.predefined_macros.clone();
    input.include_resolver = Some(Box::new(FileIncludeResolver {
        base: Path::new(filename)
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_default(),
    }));

    let mut sink = Vec::new();
    let success = {
        let mut output = ShaderOutput {
            sink: &mut sink,
            version: output_version,
            options: config.options.clone(),
        };
        let mut log = StdLog;
        info!("translate from {} to {}", filename, config.output);
        translate(&mut input, &mut output, &mut log)
    };

    let mut file = fs::File::create(&config.output)?;
    file.write_all(&sink)?;

    if success {
        info!("translation successful");
    }
    Ok(success)
}

/// Resolves `#include` relative to the including file's directory.
struct FileIncludeResolver {
    base: std::path::PathBuf,
}

impl hlslc_core::IncludeResolver for FileIncludeResolver {
    fn resolve(&mut self, name: &str) -> std::io::Result<String> {
        fs::read_to_string(self.base.join(name))
    }
}

fn main() {
    env_logger::init();
    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut config = Config::new();
    let mut translation_counter = 0usize;
    let mut show_help = false;
    let mut show_version = false;
    let mut pause_app = false;

    let mut index = 0;
    while index < args.len() {
        let arg = args[index].clone();
        let result = (|| -> Result<(), DriverError> {
            match arg.as_str() {
                "help" | "--help" | "-h" => show_help = true,
                "--version" | "-v" => show_version = true,
                "--pause" => pause_app = true,
                "-warn" => config.options.warnings = bool_arg(&args, &mut index),
                "-blanks" => config.options.blanks = bool_arg(&args, &mut index),
                "-line-marks" => config.options.line_marks = bool_arg(&args, &mut index),
                "-dump-ast" => config.options.dump_ast = bool_arg(&args, &mut index),
                "-pponly" => config.options.preprocess_only = bool_arg(&args, &mut index),
                "-comments" => config.options.keep_comments = bool_arg(&args, &mut index),
                "-entry" => config.entry = next_arg(&args, &mut index, &arg)?,
                "-target" => config.target = next_arg(&args, &mut index, &arg)?,
                "-shaderin" => config.shader_in = next_arg(&args, &mut index, &arg)?,
                "-shaderout" => config.shader_out = next_arg(&args, &mut index, &arg)?,
                "-indent" => config.options.indent = next_arg(&args, &mut index, &arg)?,
                "-prefix" => config.options.prefix = next_arg(&args, &mut index, &arg)?,
                "-output" => config.output = next_arg(&args, &mut index, &arg)?,
                _ if arg.len() > 2 && arg.starts_with("-D") => {
                    config.predefined_macros.push(predefined_macro_arg(&arg));
                }
                _ => {
                    // A positional argument is an input file; translate
                    // and reset the per-file state.
                    translate_file(&mut config, &arg)?;
                    translation_counter += 1;
                    config.reset_per_file();
                }
            }
            Ok(())
        })();

        if let Err(err) = result {
            error!("{}", err);
            eprintln!("{}", err);
        }
        index += 1;
    }

    if show_help {
        print_help();
    }
    if show_version {
        print_version();
    }
    if translation_counter == 0 && !show_help && !show_version {
        println!("no input : enter \"hlslc help\"");
    }

    if pause_app {
        println!("press enter to continue ...");
        let mut line = String::new();
        let _ = std::io::stdin().read_line(&mut line);
    }

    // Exit code 0 even after errors; diagnostics were already printed.
    std::process::exit(0);
}
