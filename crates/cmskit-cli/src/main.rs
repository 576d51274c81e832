use clap::{Parser, Subcommand};

mod decrypt;
mod encrypt;

/// CMS/PKCS#7 EnvelopedData command-line tool.
#[derive(Parser)]
#[command(name = "cmskit")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Envelope a file for a recipient certificate.
    Encrypt {
        /// Recipient certificate file (DER).
        #[arg(short, long)]
        cert: String,
        /// Content encryption algorithm (aes-128-cbc, aes-256-cbc).
        #[arg(short, long, default_value = "aes-256-cbc")]
        algorithm: String,
        /// Input file.
        input: String,
        /// Output file.
        output: String,
    },
    /// Open an enveloped file with the recipient's private key.
    Decrypt {
        /// Recipient private key file (PKCS#8, DER or PEM).
        #[arg(short, long)]
        key: String,
        /// Input file.
        input: String,
        /// Output file.
        output: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Encrypt {
            cert,
            algorithm,
            input,
            output,
        } => encrypt::run(cert, algorithm, input, output),
        Commands::Decrypt { key, input, output } => decrypt::run(key, input, output),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
