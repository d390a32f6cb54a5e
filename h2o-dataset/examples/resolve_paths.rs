//! Print the dataset files the harness would read for every size tier

use h2o_dataset::{resolve, SizeTag};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let data_dir = std::env::var("H2O_DATA_DIR").unwrap_or_else(|_| "/tmp/h2o".to_string());

    println!("Data directory: {}\n", data_dir);

    for size in SizeTag::ALL {
        let paths = resolve(&data_dir, size)?;
        let missing = paths.missing();

        println!("{}:", size);
        for (key, path) in paths.iter() {
            let marker = if missing.contains(&path) { "missing" } else { "ok" };
            println!("  {:<12} {} ({})", key, path.display(), marker);
        }
        println!();
    }

    Ok(())
}
