//! Command line arguments

use clap::Parser;
use regex::Regex;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Tokens accepted as the optional trailing "foreign keys" argument
const FOREIGN_KEY_TOKENS: &[&str] = &["foreignkeys", "-foreignkeys", "fk", "-fk"];

#[derive(Parser, Debug)]
#[command(name = "sql-to-xsd")]
#[command(about = "MS SQL Database to XSD - Schema generator", long_about = None)]
#[command(version)]
#[command(after_help = "Example:\n  sql-to-xsd \"server=.\\sqlexpress;database=DatabaseName;uid=sa;pwd=password\" theSchema theDataSet theSchema.xsd fk")]
pub struct Cli {
    /// ADO.NET style connection string
    pub connection: String,

    /// Value of the schema `id` attribute
    #[arg(value_parser = parse_ncname)]
    pub schema_id: String,

    /// Name of the dataset root element
    #[arg(value_parser = parse_ncname)]
    pub dataset_name: String,

    /// Output XSD file, overwritten if it exists
    pub target_file: PathBuf,

    /// Include foreign keys as relationships (fk, foreignkeys)
    #[arg(value_name = "FOREIGN_KEYS", value_parser = parse_foreign_keys_token, allow_hyphen_values = true)]
    pub foreign_keys_token: Option<ForeignKeysToken>,

    /// Include foreign keys as relationships
    #[arg(long = "foreign-keys", visible_alias = "fk")]
    pub foreign_keys: bool,

    /// Config file (defaults to ~/.config/sqltoxsd/config.toml)
    #[arg(long, env = "SQLTOXSD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    pub verbose: bool,
}

/// Marker for an accepted trailing foreign keys token
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ForeignKeysToken;

impl Cli {
    /// Whether relationship metadata was requested on the command line
    pub fn include_relationships(&self) -> bool {
        self.foreign_keys || self.foreign_keys_token.is_some()
    }
}

fn parse_foreign_keys_token(value: &str) -> Result<ForeignKeysToken, String> {
    let lowered = value.to_lowercase();
    if FOREIGN_KEY_TOKENS.contains(&lowered.as_str()) {
        Ok(ForeignKeysToken)
    } else {
        Err(format!("expected one of: {}", FOREIGN_KEY_TOKENS.join(", ")))
    }
}

fn ncname() -> &'static Regex {
    static NCNAME: OnceLock<Regex> = OnceLock::new();
    NCNAME.get_or_init(|| {
        Regex::new(r"^[\p{L}_][\p{L}\p{M}\p{N}\u{B7}._\-]*$").expect("NCName pattern is valid")
    })
}

/// Accept only XML names without a prefix, as they end up as element names
fn parse_ncname(value: &str) -> Result<String, String> {
    if ncname().is_match(value) {
        Ok(value.to_string())
    } else {
        Err(format!("`{}` is not a valid XML name", value))
    }
}
