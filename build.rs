use dotenv::dotenv;
use std::env;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;
use toml::Value;

const KEY_LEN: usize = 32;
const IV_LEN: usize = 16;

/// Writes `app_metadata.rs` into OUT_DIR for `include!` by the secret module.
struct AppMetadata {
    file: File,
}

impl AppMetadata {
    fn create() -> io::Result<Self> {
        let out_dir = env::var("OUT_DIR").map_err(|e| io::Error::new(io::ErrorKind::NotFound, e))?;
        let file = File::create(Path::new(&out_dir).join("app_metadata.rs"))?;
        Ok(Self { file })
    }

    fn write(&mut self, key: &str, value: &str) -> io::Result<()> {
        writeln!(self.file, "#[allow(unused)]\npub const APP_METADATA_{}: &str = {:?};", key.to_uppercase(), value)
    }

    fn write_bytes(&mut self, key: &str, value: &[u8]) -> io::Result<()> {
        let bytes = value.iter().map(|b| b.to_string()).collect::<Vec<_>>().join(", ");
        writeln!(
            self.file,
            "#[allow(unused)]\npub const APP_METADATA_{}: &[u8; {}] = &[{}];",
            key.to_uppercase(),
            value.len(),
            bytes
        )
    }
}

/// Pads or truncates a seed string to exactly `len` bytes.
fn fit(seed: String, len: usize) -> Vec<u8> {
    let mut bytes = seed.into_bytes();
    bytes.resize(len, b'!');
    bytes
}

fn main() -> io::Result<()> {
    println!("cargo:rerun-if-changed=Cargo.toml");
    println!("cargo:rerun-if-env-changed=ENCRYPTION_KEY");
    println!("cargo:rerun-if-env-changed=ENCRYPTION_IV");

    let _ = dotenv();

    let package_name = env::var("CARGO_PKG_NAME").unwrap_or_else(|_| "jtimer".to_string());
    let mut app_metadata = AppMetadata::create()?;
    app_metadata.write("NAME", &package_name)?;
    app_metadata.write("VERSION", &env::var("CARGO_PKG_VERSION").unwrap_or_default())?;

    let cargo_toml = fs::read_to_string("Cargo.toml")?;
    let cargo_toml: Value = toml::from_str(&cargo_toml).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    if let Some(metadata) = cargo_toml.get("package").and_then(|pkg| pkg.get("metadata")).and_then(|meta| meta.as_table()) {
        for (key, value) in metadata {
            if let Some(value) = value.as_str() {
                app_metadata.write(key, value)?;
            }
        }
    }

    let (key, iv) = match (env::var("ENCRYPTION_KEY"), env::var("ENCRYPTION_IV")) {
        (Ok(key), Ok(iv)) if key.len() == KEY_LEN && iv.len() == IV_LEN => (key.into_bytes(), iv.into_bytes()),
        (Ok(key), Ok(iv)) => {
            panic!(
                "ENCRYPTION_KEY must be {} bytes and ENCRYPTION_IV {} bytes, got {} and {}",
                KEY_LEN,
                IV_LEN,
                key.len(),
                iv.len()
            );
        }
        _ => {
            println!("cargo:warning=ENCRYPTION_KEY or ENCRYPTION_IV not found in environment.");
            println!("cargo:warning=Using default keys. For production, create a .env file with both values.");
            (
                fit(format!("{}_default_encryption_key_32b", package_name), KEY_LEN),
                fit(format!("{}_iv_16b", package_name), IV_LEN),
            )
        }
    };

    app_metadata.write_bytes("ENCRYPTION_KEY", &key)?;
    app_metadata.write_bytes("ENCRYPTION_IV", &iv)?;

    Ok(())
}
