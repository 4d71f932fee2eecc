//! Standalone validator for the bot's data files.
//!
//! Checks the student directory, certificate links and FAQ content in a
//! data directory before the bot is deployed with them.

use std::process::ExitCode;

use clap::Parser;

use student_gate_bot::config::{DataBundle, DateTopic};

/// Data directory validator.
#[derive(Parser, Debug)]
#[command(name = "validate_data")]
#[command(about = "Validates data files for the student Telegram bot")]
#[command(version)]
struct Args {
    /// Directory holding the JSON data files.
    #[arg(short, long, default_value = "data")]
    data_dir: String,

    /// Validate for a passcode deployment (student directory optional).
    #[arg(short, long)]
    passcode_mode: bool,

    /// Generate example data files in the specified directory.
    #[arg(long)]
    generate_example: Option<String>,

    /// Show detailed information for each entry.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Handle example generation
    if let Some(output_dir) = args.generate_example {
        return generate_example(&output_dir);
    }

    // Validate the data directory
    validate_dir(&args.data_dir, !args.passcode_mode, args.verbose)
}

fn generate_example(output_dir: &str) -> ExitCode {
    let example = DataBundle::example();

    match example.save_to_dir(output_dir) {
        Ok(()) => {
            println!("✓ Example data written to: {output_dir}/");
            println!(
                "\nThe files contain {} students, {} resources and {} dates.",
                example.students.len(),
                example.faq.resources.len(),
                example.faq.dates.len()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Failed to write example data: {e}");
            ExitCode::FAILURE
        }
    }
}

fn validate_dir(dir: &str, require_students: bool, verbose: bool) -> ExitCode {
    println!("Validating: {dir}");
    println!(
        "Login mode: {}\n",
        if require_students { "Student ID" } else { "Passcode" }
    );

    // Load the data files
    let data = match DataBundle::load_from_dir(dir, require_students) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("✗ Failed to load data: {e}");
            return ExitCode::FAILURE;
        }
    };

    if verbose {
        print_details(&data);
    }

    // Hard errors fail the run; warnings are only reported
    match data.validate(require_students) {
        Ok(warnings) => {
            for warning in &warnings {
                println!("  ⚠ Warning: {warning}");
            }
            if !warnings.is_empty() {
                println!();
            }

            // Summary
            println!("✓ Data is valid!");
            println!("  Students:          {}", data.students.len());
            println!("  Certificate links: {}", data.certificates.len());
            println!("  Resources:         {}", data.faq.resources.len());
            println!("  Calendar dates:    {}", data.faq.dates.len());

            if !warnings.is_empty() {
                println!("  ({} warning(s))", warnings.len());
            }

            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("✗ Validation failed: {e}");
            ExitCode::FAILURE
        }
    }
}

fn print_details(data: &DataBundle) {
    let mut students: Vec<_> = data.students.iter().collect();
    students.sort();
    for (id, name) in students {
        let certificate = if data.certificates.contains_key(id) {
            "certificate"
        } else {
            "no certificate"
        };
        println!("[{id}] {} ({certificate})", truncate(name, 40));
    }

    for resource in &data.faq.resources {
        println!("[resource] {} -> {}", resource.keyword, truncate(&resource.url, 60));
    }

    for topic in DateTopic::ALL {
        for entry in data.faq.dates_for(topic) {
            println!("[{topic}] {} {}", entry.date, truncate(&entry.label, 40));
        }
    }

    println!();
}

/// Truncates a string for display.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_owned()
    } else {
        format!("{}...", s.chars().take(max_len).collect::<String>())
    }
}
