use anyhow::Result;
use log::info;
use std::path::PathBuf;

use ncgen::schema::{Cardinality, DimensionSpec, Schema, ValidSchema, VariableSpec};

/// Load and validate a configuration
pub fn run(config: PathBuf) -> Result<()> {
    info!("Checking configuration: {}", config.display());

    let result = Schema::from_path(&config).and_then(Schema::validate);
    match result {
        Ok(schema) => {
            #[cfg(feature = "colorized_output")]
            {
                println!("{}", format_colored(&config, &schema));
            }

            #[cfg(not(feature = "colorized_output"))]
            {
                println!("{}", format_plain(&config, &schema));
            }

            Ok(())
        }
        Err(e) => {
            #[cfg(feature = "colorized_output")]
            {
                eprintln!("{}: {}", console::style("INVALID").red().bold(), e);
            }

            #[cfg(not(feature = "colorized_output"))]
            {
                eprintln!("INVALID: {}", e);
            }

            std::process::exit(1);
        }
    }
}

fn cardinality(dim: &DimensionSpec) -> String {
    match &dim.cardinality {
        Cardinality::Fixed(n) => n.to_string(),
        Cardinality::Unlimited => "UNLIMITED".to_string(),
        Cardinality::FromData(key) => format!("from data '{key}'"),
    }
}

fn scope_lines(dimensions: &[DimensionSpec], variables: &[VariableSpec], indent: &str) -> String {
    let mut out = String::new();
    for dim in dimensions {
        out.push_str(&format!("{indent}dimension {} = {}\n", dim.name, cardinality(dim)));
    }
    for var in variables {
        out.push_str(&format!(
            "{indent}variable {} {}({}){}\n",
            var.dtype_name,
            var.name,
            var.dimensions.join(", "),
            if var.packing.is_some() { " packed" } else { "" }
        ));
    }
    out
}

#[cfg_attr(feature = "colorized_output", allow(dead_code))]
fn format_plain(config: &std::path::Path, schema: &ValidSchema) -> String {
    let mut out = format!("Configuration: {}\n", config.display());
    out.push_str(&format!(
        "{} global attributes\n",
        schema.global_attributes.len()
    ));
    out.push_str(&scope_lines(&schema.dimensions, &schema.variables, "  "));
    for group in &schema.groups {
        out.push_str(&format!("group {}\n", group.name));
        out.push_str(&scope_lines(&group.dimensions, &group.variables, "  "));
    }
    out.push_str("VALID");
    out
}

#[cfg(feature = "colorized_output")]
fn format_colored(config: &std::path::Path, schema: &ValidSchema) -> String {
    use console::style;

    let mut out = format!(
        "{}: {}\n",
        style("Configuration").bold(),
        config.display()
    );
    out.push_str(&format!(
        "{} global attributes\n",
        style(schema.global_attributes.len()).cyan()
    ));
    out.push_str(&scope_lines(&schema.dimensions, &schema.variables, "  "));
    for group in &schema.groups {
        out.push_str(&format!("{} {}\n", style("group").bold(), group.name));
        out.push_str(&scope_lines(&group.dimensions, &group.variables, "  "));
    }
    out.push_str(&format!("{}", style("VALID").green().bold()));
    out
}
