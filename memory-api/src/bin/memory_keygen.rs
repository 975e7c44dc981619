//! `memory-keygen` — prints a fresh base64-encoded master key for
//! `ENCRYPTION_MASTER_KEY`. Unlike a keypair-generation CLI, there's no
//! on-disk ceremony: this service has exactly one symmetric key to
//! manage, so there's nothing to write to a directory.

use memory_envelope::CryptoEnvelope;

const USAGE: &str = r#"memory-keygen — generate an encryption master key

USAGE:
    memory-keygen

Prints one fresh base64-encoded 256-bit key to stdout, suitable for
ENCRYPTION_MASTER_KEY. Nothing is written to disk; redirect as needed:

    memory-keygen > master.key
"#;

fn main() {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    if argv.iter().any(|a| a == "-h" || a == "--help") {
        print!("{USAGE}");
        return;
    }
    if let Some(extra) = argv.first() {
        eprintln!("error: unknown argument '{extra}'");
        eprint!("{USAGE}");
        std::process::exit(1);
    }

    println!("{}", CryptoEnvelope::generate_master_key());
}
