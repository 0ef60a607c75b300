use std::path::PathBuf;

use inquire::validator::Validation;
use inquire::{Confirm, CustomType, Select, Text};

use crate::config::{DEFAULT_CPUS, DEFAULT_IP, DEFAULT_MEMORY, DEFAULT_PROVIDER};
use crate::error::SteadError;

const PROVIDERS: [&str; 4] = [
    "virtualbox",
    "vmware_fusion",
    "vmware_workstation",
    "parallels",
];

// ── starter state ────────────────────────────────────────

struct StarterConfig {
    provider: String,
    ip: String,
    memory: u32,
    cpus: u32,
    folder_map: String,
    folder_to: String,
    site_map: String,
    site_to: String,
    databases: Vec<String>,
}

fn default_config() -> StarterConfig {
    StarterConfig {
        provider: DEFAULT_PROVIDER.into(),
        ip: DEFAULT_IP.into(),
        memory: DEFAULT_MEMORY,
        cpus: DEFAULT_CPUS,
        folder_map: "~/code".into(),
        folder_to: "/home/stead/code".into(),
        site_map: "stead.test".into(),
        site_to: "/home/stead/code/public".into(),
        databases: vec!["stead".into()],
    }
}

// ── public entry point ───────────────────────────────────

pub fn run(defaults: bool) -> Result<(), SteadError> {
    let output_path = PathBuf::from("stead.yaml");

    if output_path.exists() {
        if defaults {
            return Err(SteadError::Validation {
                message: "stead.yaml already exists (use interactive mode to overwrite)".into(),
            });
        }
        let overwrite = Confirm::new("stead.yaml already exists. Overwrite?")
            .with_default(false)
            .prompt()
            .map_err(map_inquire_err)?;
        if !overwrite {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let config = if defaults {
        default_config()
    } else {
        run_wizard()?
    };

    let yaml = generate_yaml(&config);
    std::fs::write(&output_path, &yaml).map_err(|source| SteadError::ConfigWrite {
        path: output_path.display().to_string(),
        source,
    })?;

    println!("Created stead.yaml");
    println!("Run `stead plan` to see the provision plan.");
    Ok(())
}

// ── interactive wizard ───────────────────────────────────

fn run_wizard() -> Result<StarterConfig, SteadError> {
    println!();

    let provider = Select::new("Provider:", PROVIDERS.to_vec())
        .with_help_message("Which virtualization provider the orchestrator should use")
        .prompt()
        .map_err(map_inquire_err)?
        .to_string();

    let ip = Text::new("Private network IP:")
        .with_default(DEFAULT_IP)
        .with_validator(|input: &str| {
            let octets: Vec<&str> = input.split('.').collect();
            let valid = octets.len() == 4 && octets.iter().all(|o| o.parse::<u8>().is_ok());
            if valid {
                Ok(Validation::Valid)
            } else {
                Ok(Validation::Invalid("Must be a dotted IPv4 address".into()))
            }
        })
        .prompt()
        .map_err(map_inquire_err)?;

    let memory: u32 = CustomType::new("Memory (MB):")
        .with_default(DEFAULT_MEMORY)
        .with_error_message("Please enter a valid number")
        .with_validator(|val: &u32| {
            if *val >= 256 {
                Ok(Validation::Valid)
            } else {
                Ok(Validation::Invalid("Must be at least 256".into()))
            }
        })
        .prompt()
        .map_err(map_inquire_err)?;

    let cpus: u32 = CustomType::new("CPUs:")
        .with_default(DEFAULT_CPUS)
        .with_error_message("Please enter a valid number")
        .with_validator(|val: &u32| {
            if *val >= 1 {
                Ok(Validation::Valid)
            } else {
                Ok(Validation::Invalid("Must be at least 1".into()))
            }
        })
        .prompt()
        .map_err(map_inquire_err)?;

    let folder_map = Text::new("Shared folder on the host:")
        .with_default("~/code")
        .prompt()
        .map_err(map_inquire_err)?;

    let folder_to = Text::new("Mount point in the guest:")
        .with_default("/home/stead/code")
        .with_validator(absolute_path_validator)
        .prompt()
        .map_err(map_inquire_err)?;

    let site_map = Text::new("Site name:")
        .with_default("stead.test")
        .prompt()
        .map_err(map_inquire_err)?;

    let site_to = Text::new("Site document root in the guest:")
        .with_default("/home/stead/code/public")
        .with_validator(absolute_path_validator)
        .prompt()
        .map_err(map_inquire_err)?;

    let mut databases = Vec::new();
    loop {
        let prompt = if databases.is_empty() {
            "Database name:"
        } else {
            "Another database name (empty to finish):"
        };
        let name = Text::new(prompt)
            .with_default(if databases.is_empty() { "stead" } else { "" })
            .with_validator(|input: &str| {
                if input
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
                {
                    Ok(Validation::Valid)
                } else {
                    Ok(Validation::Invalid(
                        "Use only alphanumeric, dash, or underscore".into(),
                    ))
                }
            })
            .prompt()
            .map_err(map_inquire_err)?;

        if name.is_empty() {
            break;
        }
        databases.push(name);
    }

    Ok(StarterConfig {
        provider,
        ip,
        memory,
        cpus,
        folder_map,
        folder_to,
        site_map,
        site_to,
        databases,
    })
}

fn absolute_path_validator(
    input: &str,
) -> Result<Validation, Box<dyn std::error::Error + Send + Sync>> {
    if input.starts_with('/') {
        Ok(Validation::Valid)
    } else {
        Ok(Validation::Invalid("Must be an absolute path".into()))
    }
}

// ── YAML generation ──────────────────────────────────────

fn generate_yaml(config: &StarterConfig) -> String {
    let mut out = String::new();

    out.push_str(&format!("provider: {}\n", config.provider));
    out.push_str(&format!("ip: \"{}\"\n", config.ip));
    out.push_str(&format!("memory: {}\n", config.memory));
    out.push_str(&format!("cpus: {}\n", config.cpus));
    out.push('\n');

    out.push_str("folders:\n");
    out.push_str(&format!("  - map: {}\n", config.folder_map));
    out.push_str(&format!("    to: {}\n", config.folder_to));
    out.push('\n');

    out.push_str("sites:\n");
    out.push_str(&format!("  - map: {}\n", config.site_map));
    out.push_str(&format!("    to: {}\n", config.site_to));
    out.push('\n');

    out.push_str("databases:\n");
    for db in &config.databases {
        out.push_str(&format!("  - {db}\n"));
    }
    out.push('\n');

    // commented-out hints for the optional sections
    out.push_str("# authorize: ~/.ssh/id_ed25519.pub\n");
    out.push_str("#\n");
    out.push_str("# keys:\n");
    out.push_str("#   - ~/.ssh/id_ed25519\n");
    out.push_str("#\n");
    out.push_str("# ports:\n");
    out.push_str("#   - guest: 6379\n");
    out.push_str("#     host: 16379\n");
    out.push_str("#\n");
    out.push_str("# variables:\n");
    out.push_str("#   - key: APP_ENV\n");
    out.push_str("#     value: local\n");

    out
}

// ── error mapping ────────────────────────────────────────

fn map_inquire_err(e: inquire::InquireError) -> SteadError {
    match e {
        inquire::InquireError::OperationCanceled | inquire::InquireError::OperationInterrupted => {
            SteadError::InitCancelled
        }
        other => SteadError::Validation {
            message: format!("prompt error: {other}"),
        },
    }
}

// ── tests ────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{self, Settings};

    #[test]
    fn generated_yaml_round_trips() {
        let yaml = generate_yaml(&default_config());
        let mut settings: Settings = facet_yaml::from_str(&yaml).unwrap();
        settings.normalize();
        config::validate(&settings).unwrap();

        assert_eq!(settings.provider.as_deref(), Some("virtualbox"));
        assert_eq!(settings.ip.as_deref(), Some(DEFAULT_IP));
        assert_eq!(settings.memory, Some(DEFAULT_MEMORY));
        assert_eq!(settings.cpus, Some(DEFAULT_CPUS));
        assert_eq!(settings.sites.as_ref().unwrap().len(), 1);
        assert_eq!(settings.databases.as_ref().unwrap(), &["stead"]);
    }

    #[test]
    fn generated_yaml_builds_a_plan() {
        let yaml = generate_yaml(&default_config());
        let mut settings: Settings = facet_yaml::from_str(&yaml).unwrap();
        settings.normalize();
        let plan = crate::plan::build_plan(&settings, std::path::Path::new("scripts")).unwrap();
        assert!(!plan.is_empty());
    }

    #[test]
    fn generated_yaml_keeps_optional_sections_commented() {
        let yaml = generate_yaml(&default_config());
        let settings: Settings = facet_yaml::from_str(&yaml).unwrap();
        assert!(settings.authorize.is_none());
        assert!(settings.keys.is_none());
        assert!(settings.ports.is_none());
        assert!(settings.variables.is_none());
    }

    #[test]
    fn generated_yaml_multiple_databases() {
        let config = StarterConfig {
            databases: vec!["app".into(), "analytics".into()],
            ..default_config()
        };
        let yaml = generate_yaml(&config);
        let settings: Settings = facet_yaml::from_str(&yaml).unwrap();
        assert_eq!(settings.databases.as_ref().unwrap(), &["app", "analytics"]);
    }
}
