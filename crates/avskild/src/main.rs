#![forbid(unsafe_code)]

//! avskild CLI: create, verify and inspect detached XML signatures.

use avskild::names;
use avskild_core::algorithm;
use avskild_dsig::{Document, VerifyResult, XmlDigitalSignature};
use avskild_keys::KeyStoreConfig;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::error::Error as StdError;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "avskild",
    about = "avskild: detached XML digital signatures",
    version
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign a file and write the detached signature document
    Sign {
        /// File to sign
        file: PathBuf,

        /// Reference URI recorded in the signature (default: the file's name)
        #[arg(long)]
        name: Option<String>,

        /// Digest algorithm URI or short name
        #[arg(long, default_value = "sha512")]
        digest: String,

        /// Signature algorithm URI or short name
        #[arg(long, default_value = "rsa-sha512")]
        signature: String,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        keystore: KeyStoreArgs,
    },

    /// Verify a detached signature against the original file
    Verify {
        /// The original, signed content
        file: PathBuf,

        /// The signature document
        signature: PathBuf,

        #[command(flatten)]
        keystore: KeyStoreArgs,
    },

    /// Show what a signature document declares, without verifying it
    Inspect {
        /// The signature document
        signature: PathBuf,
    },

    /// List supported algorithms
    Info,
}

#[derive(Args)]
struct KeyStoreArgs {
    /// PKCS#12 key store
    #[arg(long, env = "AVSKILD_KEYSTORE")]
    keystore: PathBuf,

    /// Alias of the key entry
    #[arg(long, env = "AVSKILD_KEY_ALIAS")]
    alias: String,

    /// Key store password
    #[arg(
        long,
        env = "AVSKILD_KEYSTORE_PASSWORD",
        hide_env_values = true,
        required_unless_present = "password_file"
    )]
    password: Option<String>,

    /// Read the key store password from the first line of a file (overrides --password)
    #[arg(long, env = "AVSKILD_KEYSTORE_PASSWORD_FILE")]
    password_file: Option<PathBuf>,
}

impl KeyStoreArgs {
    fn into_config(self) -> Result<KeyStoreConfig, Box<dyn StdError>> {
        let config = KeyStoreConfig::new(
            self.keystore,
            self.alias,
            self.password.unwrap_or_default(),
        );
        match self.password_file {
            Some(path) => {
                let text = std::fs::read_to_string(&path)
                    .map_err(|e| format!("{}: {e}", path.display()))?;
                let password = text.lines().next().unwrap_or("");
                Ok(config.with_password(password))
            }
            None => Ok(config),
        }
    }
}

type CliResult = Result<ExitCode, Box<dyn StdError>>;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Sign {
            file,
            name,
            digest,
            signature,
            output,
            keystore,
        } => cmd_sign(file, name, &digest, &signature, output, keystore),
        Commands::Verify {
            file,
            signature,
            keystore,
        } => cmd_verify(file, signature, keystore),
        Commands::Inspect { signature } => cmd_inspect(signature),
        Commands::Info => cmd_info(),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", error_chain(e.as_ref()));
            ExitCode::from(2)
        }
    }
}

fn init_logging(verbose: u8) {
    use tracing_subscriber::EnvFilter;
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_sign(
    file: PathBuf,
    name: Option<String>,
    digest: &str,
    signature: &str,
    output: Option<PathBuf>,
    keystore: KeyStoreArgs,
) -> CliResult {
    let digest_method = names::digest_uri(digest)?;
    let signature_method = names::signature_uri(signature)?;
    let data = read_file(&file)?;
    let name = match name {
        Some(name) => name,
        None => file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| format!("{}: cannot derive a reference name", file.display()))?,
    };

    let dsig = XmlDigitalSignature::from_key_store(keystore.into_config()?);
    let signed = dsig.generate_detached_signature(
        &Document::new(name, data),
        digest_method,
        signature_method,
    )?;
    write_output(output, &signed)?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_verify(file: PathBuf, signature: PathBuf, keystore: KeyStoreArgs) -> CliResult {
    let original = read_file(&file)?;
    let signature_document = read_file(&signature)?;

    let dsig = XmlDigitalSignature::from_key_store(keystore.into_config()?);
    match dsig.verify_detached_signature_detailed(&original, &signature_document)? {
        VerifyResult::Valid => {
            println!("OK");
            Ok(ExitCode::SUCCESS)
        }
        VerifyResult::Invalid { reason } => {
            println!("INVALID: {reason}");
            Ok(ExitCode::from(1))
        }
    }
}

fn cmd_inspect(signature: PathBuf) -> CliResult {
    let signature_document = read_file(&signature)?;
    let summary = avskild_dsig::inspect::inspect(&signature_document)?;
    print!("{summary}");
    Ok(ExitCode::SUCCESS)
}

fn cmd_info() -> CliResult {
    println!("avskild: detached XML digital signatures");
    println!();
    println!("Digest algorithms:");
    for uri in algorithm::DIGESTS {
        println!("  {:<16} {uri}", short_name(names::DIGEST_NAMES, uri));
    }
    println!();
    println!("Signature algorithms:");
    for uri in algorithm::SIGNATURES {
        println!("  {:<16} {uri}", short_name(names::SIGNATURE_NAMES, uri));
    }
    println!();
    println!("Canonicalization:");
    println!("  {}", algorithm::C14N);
    println!("  {} (verify only)", algorithm::C14N_WITH_COMMENTS);
    println!();
    println!("Key stores:");
    println!("  PKCS#12 (RSA, EC P-256, EC P-384)");
    Ok(ExitCode::SUCCESS)
}

// ── Utility functions ────────────────────────────────────────────────

fn short_name(names: &[(&'static str, &str)], uri: &str) -> &'static str {
    names
        .iter()
        .find(|(_, u)| *u == uri)
        .map(|(short, _)| *short)
        .unwrap_or("")
}

fn read_file(path: &Path) -> Result<Vec<u8>, Box<dyn StdError>> {
    std::fs::read(path).map_err(|e| format!("{}: {e}", path.display()).into())
}

fn write_output(path: Option<PathBuf>, data: &[u8]) -> Result<(), Box<dyn StdError>> {
    match path {
        Some(p) => std::fs::write(&p, data).map_err(|e| format!("{}: {e}", p.display()).into()),
        None => {
            use std::io::Write;
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(data)?;
            stdout.flush()?;
            Ok(())
        }
    }
}

fn error_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
