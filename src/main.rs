use clap::Parser;
use tracing_subscriber::EnvFilter;

use stead::cli::{Cli, Command, OutputFormat};
use stead::config::{self, Machine};
use stead::plan::{self, Directive};

fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("stead=debug")
    } else {
        EnvFilter::from_default_env()
            .add_directive("stead=warn".parse().expect("valid log directive"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Handle init before loading settings, since it creates them
    if let Command::Init { defaults } = cli.command {
        return stead::init::run(defaults).map_err(Into::into);
    }

    let mut settings = config::load_settings(&cli.config)?;
    settings.normalize();
    config::validate(&settings)?;
    config::export_default_provider(&settings);

    let machine = settings.machine();

    match cli.command {
        Command::Init { .. } => unreachable!(),
        Command::Check => match cli.output {
            OutputFormat::Json => {
                println!(
                    "{}",
                    facet_json::to_string(&machine_json(&machine)).expect("JSON serialization")
                );
            }
            OutputFormat::Plain => {
                println!("Settings OK.");
                print_machine(&machine);
            }
        },
        Command::Plan => {
            let plan = plan::build_plan(&settings, &cli.scripts)?;
            match cli.output {
                OutputFormat::Json => {
                    let out = PlanJson {
                        machine: machine_json(&machine),
                        directives: plan.iter().map(directive_json).collect(),
                    };
                    println!(
                        "{}",
                        facet_json::to_string(&out).expect("JSON serialization")
                    );
                }
                OutputFormat::Plain => {
                    print_machine(&machine);
                    for (i, directive) in plan.iter().enumerate() {
                        println!("{:3}. {}", i + 1, describe(directive));
                    }
                }
            }
        }
    }

    Ok(())
}

// ── plain rendering ─────────────────────────────────────────────────

fn print_machine(machine: &Machine) {
    println!(
        "machine '{}' ({}) provider={} ip={} memory={} cpus={}",
        machine.hostname,
        machine.box_name,
        machine.provider,
        machine.ip,
        machine.memory,
        machine.cpus,
    );
}

fn describe(directive: &Directive) -> String {
    match directive {
        Directive::ForwardPort {
            guest,
            host,
            protocol,
        } => format!("forward {guest}/{protocol} -> host {host}"),
        Directive::SyncedFolder {
            map,
            to,
            kind,
            mount_options,
        } => {
            let kind = kind.as_deref().unwrap_or("default");
            if mount_options.is_empty() {
                format!("folder {map} -> {to} ({kind})")
            } else {
                format!("folder {map} -> {to} ({kind}, {})", mount_options.join(","))
            }
        }
        Directive::Script { path, args } => {
            if args.is_empty() {
                format!("script {}", path.display())
            } else {
                format!("script {} [{}]", path.display(), args.join(", "))
            }
        }
        Directive::Inline {
            template,
            args,
            privileged,
        } => {
            let label = if *privileged {
                "inline"
            } else {
                "inline (unprivileged)"
            };
            let head: String = template
                .lines()
                .next()
                .unwrap_or_default()
                .chars()
                .take(60)
                .collect();
            if args.is_empty() {
                format!("{label}: {head}")
            } else {
                format!("{label}: {head} ({} args)", args.len())
            }
        }
    }
}

// ── JSON output structs ─────────────────────────────────────────────

#[derive(facet::Facet)]
struct PlanJson {
    machine: MachineJson,
    directives: Vec<DirectiveJson>,
}

#[derive(facet::Facet)]
struct MachineJson {
    #[facet(rename = "box")]
    box_name: String,
    hostname: String,
    provider: String,
    ip: String,
    memory: u32,
    cpus: u32,
}

#[derive(Default, facet::Facet)]
struct DirectiveJson {
    kind: String,
    guest: Option<u16>,
    host: Option<u16>,
    protocol: Option<String>,
    map: Option<String>,
    to: Option<String>,
    mount_type: Option<String>,
    mount_options: Vec<String>,
    script: Option<String>,
    template: Option<String>,
    args: Vec<String>,
    privileged: Option<bool>,
}

fn machine_json(machine: &Machine) -> MachineJson {
    MachineJson {
        box_name: machine.box_name.clone(),
        hostname: machine.hostname.clone(),
        provider: machine.provider.clone(),
        ip: machine.ip.clone(),
        memory: machine.memory,
        cpus: machine.cpus,
    }
}

fn directive_json(directive: &Directive) -> DirectiveJson {
    match directive {
        Directive::ForwardPort {
            guest,
            host,
            protocol,
        } => DirectiveJson {
            kind: "forward_port".into(),
            guest: Some(*guest),
            host: Some(*host),
            protocol: Some(protocol.clone()),
            ..Default::default()
        },
        Directive::SyncedFolder {
            map,
            to,
            kind,
            mount_options,
        } => DirectiveJson {
            kind: "synced_folder".into(),
            map: Some(map.clone()),
            to: Some(to.clone()),
            mount_type: kind.clone(),
            mount_options: mount_options.clone(),
            ..Default::default()
        },
        Directive::Script { path, args } => DirectiveJson {
            kind: "script".into(),
            script: Some(path.display().to_string()),
            args: args.clone(),
            ..Default::default()
        },
        Directive::Inline {
            template,
            args,
            privileged,
        } => DirectiveJson {
            kind: "inline".into(),
            template: Some((*template).to_string()),
            args: args.clone(),
            privileged: Some(*privileged),
            ..Default::default()
        },
    }
}
