use shared_types::write_typescript_definitions;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Output path may be given as the first argument
    let output_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("web/api-types/types.ts"));

    write_typescript_definitions(&output_path)?;
    println!("Generated TypeScript types in {}", output_path.display());

    Ok(())
}
