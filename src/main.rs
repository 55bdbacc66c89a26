use std::env;
use std::path::Path;

use anyhow::{bail, Context};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use screenplan::client::ScreenApi;
use screenplan::draft::{Draft, GroupDraft, PlanDraft};
use screenplan::editor::{Editor, SubmitOutcome};
use screenplan::entity::group::AddGroupRequest;
use screenplan::entity::material::{AddMaterialRequest, MaterialQuery, MediaKind};
use screenplan::entity::plan::AddPlanRequest;
use screenplan::entity::PageQuery;
use screenplan::{AppError, AppState, Config};

const USAGE: &str = "\
Usage: screenplan [-config <path>] <command>

Commands:
  login <email> <password>      Log in and store the session
  logout                        Log out and clear the session
  whoami                        Show the logged-in user
  cabinets [page]               List cabinets
  materials [page]              List materials
  material add <name> <url> <image|video>
                                Register a material by URL
  material delete <id>          Delete a material
  groups [page]                 List groups
  plans [page]                  List plans
  group show <id>               Show a group's playlist
  plan show <id>                Show a plan's schedule
  group check <file>            Validate a group JSON file
  plan check <file>             Validate a plan JSON file
  group push <file> [id]        Create (or update id) a group from a JSON file
  plan push <file> [id]         Create (or update id) a plan from a JSON file
  group delete <id>             Delete a group
  plan delete <id>              Delete a plan

Options:
  -config <path>  Path to configuration file (default: ./etc/screenplan.toml)
  -help, --help   Print this help message";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() || args.iter().any(|arg| arg == "-help" || arg == "--help") {
        println!("{USAGE}");
        return Ok(());
    }

    let mut config_path = "./etc/screenplan.toml".to_string();
    let mut command = Vec::new();
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        if arg == "-config" {
            config_path = iter.next().context("-config needs a path")?;
        } else {
            command.push(arg);
        }
    }

    // Load configuration first (before logging init)
    let config = if Path::new(&config_path).exists() {
        Config::load(&config_path)
            .with_context(|| format!("Could not load config file {config_path}"))?
    } else {
        Config::from_env()
    };

    // Priority: RUST_LOG env var > config file > default "info"
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log.level));

    fmt::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    info!("Using backend {}", config.api.base_url);

    let state = AppState::load(config)?;
    let result = run(&state, &command).await;

    // 401 responses clear the session; keep the file in step either way
    state.persist_session().await?;

    match result {
        Err(e) => match e.downcast_ref::<AppError>() {
            Some(app) if !app.is_local() => bail!("{}", app.user_message()),
            _ => Err(e),
        },
        ok => ok,
    }
}

async fn run(state: &AppState, command: &[String]) -> anyhow::Result<()> {
    let words: Vec<&str> = command.iter().map(String::as_str).collect();
    let client = &state.client;

    match words.as_slice() {
        ["login", email, password] => {
            let user = client.login(email, password).await?;
            println!("Logged in as {}", user.display_name());
        }
        ["logout"] => {
            client.logout().await?;
            println!("Logged out");
        }
        ["whoami"] => {
            let user = client.current_user().await?;
            println!("{} <{}> {:?}", user.display_name(), user.email, user.role);
        }
        ["cabinets", rest @ ..] => {
            let page = client.cabinets(page_arg(rest)?.with_size(100)).await?;
            println!("{} cabinets (page {})", page.total, page.page);
            for cabinet in page.list {
                let online = if cabinet.is_online { "online" } else { "offline" };
                println!(
                    "  {:<12} {:?} {:<8} {}",
                    cabinet.cabinet_id,
                    cabinet.model,
                    online,
                    cabinet.address.unwrap_or_default()
                );
            }
        }
        ["materials", rest @ ..] => {
            let query = MaterialQuery {
                page: Some(page_arg(rest)?.page),
                kind: None,
            };
            let page = client.materials(query).await?;
            println!("{} materials (page {})", page.total, page.page);
            for material in page.list {
                println!(
                    "  #{:<5} {:<6} {}",
                    material.id,
                    material.kind.as_str(),
                    material.display_name()
                );
            }
        }
        ["material", "add", name, path, kind] => {
            let kind = match *kind {
                "image" => MediaKind::Image,
                "video" => MediaKind::Video,
                other => bail!("Unknown material type '{other}', expected image or video"),
            };
            let request = AddMaterialRequest {
                name: name.to_string(),
                path: path.to_string(),
                kind,
            };
            let id = client.add_material(&request).await?;
            println!("Material {id} registered");
        }
        ["material", "delete", id] => {
            client.delete_material(parse_id(id)?).await?;
            println!("Material {id} deleted");
        }
        ["groups", rest @ ..] => print_groups(state, page_arg(rest)?).await?,
        ["plans", rest @ ..] => print_plans(state, page_arg(rest)?).await?,
        ["group", "show", id] => {
            let detail = client.group_detail(parse_id(id)?).await?;
            let draft = GroupDraft::from(detail);
            println!("{} ({}s per loop)", draft.name, draft.materials.total_seconds());
            for d in draft.materials.details() {
                let label = d.material_name.as_deref().unwrap_or("");
                println!("  {:>2}. material #{} {}s {}", d.sort, d.material_id, d.time, label);
            }
        }
        ["plan", "show", id] => {
            let detail = client.plan_detail(parse_id(id)?).await?;
            println!(
                "{} {} .. {} on {}",
                detail.plan_name,
                detail.start_date,
                detail.end_date,
                detail.equipment_group.to_wire()
            );
            for d in &detail.details {
                let window = d
                    .window()
                    .map(|w| w.to_string())
                    .unwrap_or_else(|e| format!("invalid ({e})"));
                let label = d.group_name.as_deref().unwrap_or("");
                println!("  {} group #{} {}", window, d.group_id, label);
            }
        }
        ["group", "check", file] => {
            let draft = read_group(file)?;
            draft.validate().map_err(AppError::Validation)?;
            println!("{} OK: {} materials", draft.name, draft.materials.len());
        }
        ["plan", "check", file] => {
            let draft = read_plan(file)?;
            draft.validate().map_err(AppError::Validation)?;
            println!(
                "{} OK: {} schedules over {} days on {} cabinets",
                draft.name,
                draft.schedule.len(),
                draft.days(),
                draft.cabinets.len()
            );
        }
        ["group", "push", file, rest @ ..] => {
            let draft = read_group(file)?;
            let outcome = push(client, draft, id_arg(rest)?).await?;
            if outcome.needs_refresh() {
                print_groups(state, PageQuery::default()).await?;
            }
        }
        ["plan", "push", file, rest @ ..] => {
            let draft = read_plan(file)?;
            let outcome = push(client, draft, id_arg(rest)?).await?;
            if outcome.needs_refresh() {
                print_plans(state, PageQuery::default()).await?;
            }
        }
        ["group", "delete", id] => {
            client.delete_group(parse_id(id)?).await?;
            println!("Group {id} deleted");
        }
        ["plan", "delete", id] => {
            client.delete_plan(parse_id(id)?).await?;
            println!("Plan {id} deleted");
        }
        _ => bail!("Unknown command: {}\n\n{USAGE}", command.join(" ")),
    }
    Ok(())
}

/// Open an editor on a new entity, or on `id` with its draft replaced by
/// `draft`, and save
async fn push<D, A>(api: &A, draft: D, id: Option<i64>) -> anyhow::Result<SubmitOutcome>
where
    D: Draft,
    A: ScreenApi<D>,
{
    let mut editor = Editor::<D>::new();
    match id {
        Some(id) => {
            editor.load(api, id).await?;
            if let Some(current) = editor.draft_mut() {
                *current = draft;
            }
        }
        None => editor.open_new(draft)?,
    }

    let outcome = editor.save(api).await?;
    match &outcome {
        SubmitOutcome::Saved { id } => println!("Saved {} {}", D::KIND, id),
        SubmitOutcome::Failed { message } => bail!("Saving {} failed: {}", D::KIND, message),
        SubmitOutcome::Stale { .. } => {}
    }
    Ok(outcome)
}

async fn print_groups(state: &AppState, query: PageQuery) -> anyhow::Result<()> {
    let page = state.client.groups(query).await?;
    println!("{} groups (page {})", page.total, page.page);
    for group in page.list {
        let count = group
            .material_count
            .map(|n| format!("{n} materials"))
            .unwrap_or_default();
        println!("  #{:<5} {:<32} {}", group.id, group.name, count);
    }
    Ok(())
}

async fn print_plans(state: &AppState, query: PageQuery) -> anyhow::Result<()> {
    let page = state.client.plans(query).await?;
    println!("{} plans (page {})", page.total, page.page);
    for plan in page.list {
        println!(
            "  #{:<5} {:<32} {} .. {}  {} cabinets",
            plan.id,
            plan.plan_name,
            plan.start_date,
            plan.end_date,
            plan.equipment_group.len()
        );
    }
    Ok(())
}

fn read_group(file: &str) -> anyhow::Result<GroupDraft> {
    let content = std::fs::read_to_string(file).with_context(|| format!("Reading {file}"))?;
    let request: AddGroupRequest =
        serde_json::from_str(&content).with_context(|| format!("Parsing {file}"))?;
    Ok(GroupDraft::from_request(request)?)
}

fn read_plan(file: &str) -> anyhow::Result<PlanDraft> {
    let content = std::fs::read_to_string(file).with_context(|| format!("Reading {file}"))?;
    let request: AddPlanRequest =
        serde_json::from_str(&content).with_context(|| format!("Parsing {file}"))?;
    Ok(PlanDraft::from_request(request)?)
}

fn parse_id(raw: &str) -> anyhow::Result<i64> {
    raw.parse()
        .with_context(|| format!("'{raw}' is not a valid id"))
}

fn id_arg(rest: &[&str]) -> anyhow::Result<Option<i64>> {
    match rest {
        [] => Ok(None),
        [id] => parse_id(id).map(Some),
        _ => bail!("Too many arguments"),
    }
}

fn page_arg(rest: &[&str]) -> anyhow::Result<PageQuery> {
    match rest {
        [] => Ok(PageQuery::default()),
        [page] => Ok(PageQuery::page(
            page.parse()
                .with_context(|| format!("'{page}' is not a page number"))?,
        )),
        _ => bail!("Too many arguments"),
    }
}
