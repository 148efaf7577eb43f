use clap::Parser;
use rand::Rng;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

const BRANDS: [&str; 10] = [
    "Dior", "Chanel", "Versace", "Armani", "Calvin Klein", "Hugo Boss", "Paco Rabanne",
    "Yves Saint Laurent", "Montblanc", "Davidoff",
];
const LINES: [&str; 8] = [
    "Sauvage", "Bleu", "Eros", "Acqua di Gio", "Eternity", "Bottled", "1 Million", "Cool Water",
];
const TYPES: [&str; 5] = ["Eau de Toilette", "Eau de Parfum", "Cologne", "Parfum", "Aftershave"];
const SIZES: [&str; 4] = ["1.7 oz", "3.4 oz", "3.3 oz", "6.7 oz"];

#[derive(Parser)]
#[command(name = "data_generator")]
#[command(about = "Write a synthetic product listing CSV")]
struct Cli {
    /// Output file
    #[arg(value_name = "PATH", default_value = "data/listings_1m.csv")]
    path: PathBuf,

    /// Number of listings to write
    #[arg(short, long, default_value_t = 1_000_000)]
    rows: usize,
}

fn main() -> std::io::Result<()> {
    let cli = Cli::parse();

    if let Some(dir) = Path::new(&cli.path).parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let mut writer = BufWriter::new(File::create(&cli.path)?);

    writeln!(writer, "brand,title,type,price,sold,available,itemLocation")?;

    let mut rng = rand::rng();
    for _ in 0..cli.rows {
        let brand = BRANDS[rng.random_range(0..BRANDS.len())];
        let line = LINES[rng.random_range(0..LINES.len())];
        let kind = TYPES[rng.random_range(0..TYPES.len())];
        let size = SIZES[rng.random_range(0..SIZES.len())];
        let price = rng.random_range(3.0..250.0_f64);
        let sold = rng.random_range(0..5_000);
        let available = rng.random_range(0..500);
        // quoted title with an embedded comma, like real marketplace exports
        writeln!(
            writer,
            "{brand},\"{brand} {line} {kind}, {size}\",{kind},{price:.2},{sold},{available},\"Newark, NJ\""
        )?;
    }
    writer.flush()?;

    println!("Sample CSV generated: {} ({} rows)", cli.path.display(), cli.rows);
    Ok(())
}
