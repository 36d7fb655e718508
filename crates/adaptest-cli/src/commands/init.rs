//! The `adaptest init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("adaptest.toml").exists() {
        println!("adaptest.toml already exists, skipping.");
    } else {
        std::fs::write("adaptest.toml", SAMPLE_CONFIG)?;
        println!("Created adaptest.toml");
    }

    std::fs::create_dir_all("item-banks")?;
    let example_path = std::path::Path::new("item-banks/example.toml");
    if example_path.exists() {
        println!("item-banks/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_BANK)?;
        println!("Created item-banks/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Tune stopping rules and scoring in adaptest.toml");
    println!("  2. Run: adaptest validate --bank item-banks/example.toml");
    println!("  3. Run: adaptest take --bank item-banks/example.toml");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# adaptest configuration

initial_theta = 0.0

[estimation]
max_iterations = 10
convergence_threshold = 0.1
curvature_epsilon = 1e-6
# "inverse-sqrt-information" reports min(1, 1/sqrt(I));
# "precision" reports 1 - min(1, 1/sqrt(I)).
confidence_scale = "inverse-sqrt-information"

[selection]
information_tolerance = 0.1

[termination]
max_questions = 20
min_questions = 5
target_precision = 0.3
relaxed_precision = 0.5

[scoring]
center = 50.0
scale = 15.0

[calibration]
learning_rate = 0.01
expected_response_secs = 30.0
discrimination_floor = 0.1
queue_capacity = 1024
max_retries = 3
retry_delay_ms = 100
"#;

const EXAMPLE_BANK: &str = r#"[bank]
id = "example"
name = "Example Item Bank"
description = "A handful of arithmetic items to get started"

[[items]]
id = "add-small"
prompt = "What is 2 + 3?"
answer = "5"
tags = ["addition"]
difficulty = -2.0
discrimination = 1.0

[[items]]
id = "sub-small"
prompt = "What is 9 - 4?"
answer = "5"
tags = ["subtraction"]
difficulty = -1.5
discrimination = 1.1

[[items]]
id = "mul-small"
prompt = "What is 6 * 7?"
answer = "42"
tags = ["multiplication"]
difficulty = -0.5
discrimination = 1.2

[[items]]
id = "div-small"
prompt = "What is 81 / 9?"
answer = "9"
tags = ["division"]
difficulty = 0.0
discrimination = 1.0

[[items]]
id = "mul-large"
prompt = "What is 17 * 23?"
answer = "391"
tags = ["multiplication"]
difficulty = 0.8
discrimination = 1.3

[[items]]
id = "square-root"
prompt = "What is the square root of 1764?"
answer = "42"
tags = ["roots"]
difficulty = 1.5
discrimination = 1.1

[[items]]
id = "power"
prompt = "What is 2 to the power of 12?"
answer = "4096"
tags = ["powers"]
difficulty = 2.0
discrimination = 0.9
guessing = 0.05
"#;
