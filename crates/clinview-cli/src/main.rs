// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod source;

use anyhow::{Context, Result, anyhow, bail};
use clinview_core::{
    NavigationNode, NavigationTree, Workspace, WorkspaceCommand, WorkspaceEvent,
    render_plain_table,
};
use config::Config;
use logging::LogTarget;
use source::{DEMO_SEED, DemoSource, FileSource, Source, WorkspaceData};
use std::env;
use std::path::PathBuf;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `clinview --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;

    let target = if options.check_only || options.dump {
        LogTarget::Stderr
    } else {
        config.log_file().map_or(LogTarget::Off, LogTarget::File)
    };
    logging::init(config.log_level(), target)?;

    let source = if options.demo {
        Source::Demo(DemoSource::new(DEMO_SEED))
    } else {
        let path = options
            .workspace_path
            .clone()
            .or_else(|| config.workspace_path())
            .ok_or_else(|| {
                anyhow!(
                    "no workspace file; pass --workspace <path>, set [data].workspace in {}, or use --demo",
                    options.config_path.display()
                )
            })?;
        Source::File(FileSource::new(path))
    };
    let data = source.load()?;
    tracing::debug!(
        source = %source.describe(),
        sections = data.sections.len(),
        "workspace loaded"
    );

    let selection = options
        .select
        .as_deref()
        .map(|raw| resolve_selection(&data.tree, raw))
        .transpose()?;

    if options.check_only {
        print!("{}", check_report(&source.describe(), &data));
        return Ok(());
    }

    let mut workspace = data.into_workspace(config.workspace_options())?;
    apply_startup_view(&mut workspace, &options, selection)?;

    if options.dump {
        print!("{}", render_dump(&workspace));
        return Ok(());
    }

    let mut runtime = source;
    clinview_tui::run_app(&mut workspace, &mut runtime)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    workspace_path: Option<PathBuf>,
    print_config_path: bool,
    print_example: bool,
    demo: bool,
    check_only: bool,
    dump: bool,
    select: Option<String>,
    search: Option<String>,
    sort: Option<String>,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        workspace_path: None,
        print_config_path: false,
        print_example: false,
        demo: false,
        check_only: false,
        dump: false,
        select: None,
        search: None,
        sort: None,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--workspace" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--workspace requires a file path"))?;
                options.workspace_path = Some(PathBuf::from(value.as_ref()));
            }
            "--select" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--select requires a section path like Orders/Active"))?;
                options.select = Some(value.as_ref().to_owned());
            }
            "--search" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--search requires text"))?;
                options.search = Some(value.as_ref().to_owned());
            }
            "--sort" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--sort requires a field key"))?;
                options.sort = Some(value.as_ref().to_owned());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--dump" => {
                options.dump = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("clinview");
    println!("  --config <path>          Use a specific config path");
    println!("  --workspace <path>       Load sections from a workspace JSON file");
    println!("  --demo                   Launch with seeded demo clinical data");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --check                  Validate config + workspace and report schema gaps");
    println!("  --dump                   Print the selected section as a plain table");
    println!("  --select <a/b>           Start on a section path, e.g. Orders/Active");
    println!("  --search <text>          Start with a search filter");
    println!("  --sort <key>             Start sorted ascending by a field key");
    println!("  --help                   Show this help");
}

/// Splits `a/b/c` against the tree, preferring the longest name at each
/// level so names that contain `/` still resolve.
fn resolve_selection(tree: &NavigationTree, raw: &str) -> Result<Vec<String>> {
    let parts = raw.split('/').collect::<Vec<_>>();
    let mut nodes: &[NavigationNode] = tree.roots();
    let mut resolved = Vec::new();
    let mut start = 0;
    while start < parts.len() {
        let found = (start + 1..=parts.len()).rev().find_map(|end| {
            let name = parts[start..end].join("/");
            nodes
                .iter()
                .find(|node| node.name == name)
                .map(|node| (end, node))
        });
        let Some((end, node)) = found else {
            let available = nodes
                .iter()
                .map(|node| node.name.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            if available.is_empty() {
                bail!("no section {raw:?}; {} has no sub-sections", resolved.join(" / "));
            }
            bail!("no section {raw:?}; expected one of {available} at level {}", resolved.len());
        };
        resolved.push(node.name.clone());
        nodes = &node.children;
        start = end;
    }
    Ok(resolved)
}

fn apply_startup_view(
    workspace: &mut Workspace,
    options: &CliOptions,
    selection: Option<Vec<String>>,
) -> Result<()> {
    if let Some(path) = selection {
        workspace.dispatch(WorkspaceCommand::SelectPath(path))?;
    }
    if let Some(search) = &options.search {
        workspace.dispatch(WorkspaceCommand::SetSearchText(search.clone()))?;
    }
    if let Some(sort) = &options.sort {
        let events = workspace.dispatch(WorkspaceCommand::SetSort(sort.clone()))?;
        if matches!(events.as_slice(), [WorkspaceEvent::SortIgnored(_)]) {
            let sortable = workspace
                .active_fields()
                .iter()
                .filter(|field| field.sortable)
                .map(|field| field.key.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            bail!(
                "cannot sort {} by {sort:?}; sortable fields: {sortable}",
                workspace.active_path().join(" / ")
            );
        }
    }
    Ok(())
}

fn render_dump(workspace: &Workspace) -> String {
    let title = workspace.active_path().join(" / ");
    match workspace.active_controller() {
        Some(controller) => format!(
            "{title}\n{}",
            render_plain_table(
                controller.collection().fields(),
                controller.view_result(),
                controller.state(),
            )
        ),
        None => format!("{title}\nno data\n"),
    }
}

fn check_report(origin: &str, data: &WorkspaceData) -> String {
    let mut lines = vec![format!(
        "workspace {origin}: {} sections, {} records",
        data.sections.len(),
        data.record_count()
    )];
    for (path, collection) in &data.sections {
        lines.push(format!("{}: {} records", path.join(" / "), collection.len()));
        for mismatch in collection.schema_mismatches() {
            lines.push(format!("  warning: {mismatch}"));
        }
    }
    for leaf in data.tree.leaf_paths() {
        let covered = data
            .sections
            .iter()
            .any(|(path, _)| leaf.starts_with(path.as_slice()));
        if !covered {
            lines.push(format!("  note: {} has no data", leaf.join(" / ")));
        }
    }
    let mut report = lines.join("\n");
    report.push('\n');
    report
}

#[cfg(test)]
mod tests {
    use super::{
        CliOptions, apply_startup_view, check_report, parse_cli_args, render_dump,
        resolve_selection,
    };
    use crate::source::{DEMO_SEED, DemoSource, parse_workspace};
    use anyhow::Result;
    use clinview_core::WorkspaceOptions;
    use clinview_testkit::demo_navigation_tree;
    use std::path::PathBuf;

    fn default_options_path() -> PathBuf {
        PathBuf::from("/tmp/clinview-config.toml")
    }

    #[test]
    fn parse_cli_args_defaults_to_provided_config_path() -> Result<()> {
        let options = parse_cli_args(Vec::<String>::new(), default_options_path())?;
        assert_eq!(
            options,
            CliOptions {
                config_path: default_options_path(),
                workspace_path: None,
                print_config_path: false,
                print_example: false,
                demo: false,
                check_only: false,
                dump: false,
                select: None,
                search: None,
                sort: None,
                show_help: false,
            }
        );
        Ok(())
    }

    #[test]
    fn parse_cli_args_reads_view_options() -> Result<()> {
        let options = parse_cli_args(
            vec![
                "--workspace",
                "/srv/ward.json",
                "--select",
                "Orders/Active",
                "--search",
                "stat",
                "--sort",
                "priority",
                "--dump",
            ],
            default_options_path(),
        )?;
        assert_eq!(options.workspace_path, Some(PathBuf::from("/srv/ward.json")));
        assert_eq!(options.select.as_deref(), Some("Orders/Active"));
        assert_eq!(options.search.as_deref(), Some("stat"));
        assert_eq!(options.sort.as_deref(), Some("priority"));
        assert!(options.dump);
        assert!(!options.check_only);
        Ok(())
    }

    #[test]
    fn parse_cli_args_errors_for_missing_values() {
        for (flag, expected) in [
            ("--config", "--config requires a file path"),
            ("--workspace", "--workspace requires a file path"),
            ("--select", "--select requires a section path"),
            ("--search", "--search requires text"),
            ("--sort", "--sort requires a field key"),
        ] {
            let error = parse_cli_args(vec![flag], default_options_path())
                .expect_err("missing value should fail");
            assert!(error.to_string().contains(expected), "{flag}: {error}");
        }
    }

    #[test]
    fn parse_cli_args_errors_for_unknown_argument() {
        let error = parse_cli_args(vec!["--wat"], default_options_path())
            .expect_err("unknown arg should fail");
        let message = error.to_string();
        assert!(message.contains("unknown argument"));
        assert!(message.contains("--help"));
    }

    #[test]
    fn parse_cli_args_sets_print_and_check_flags() -> Result<()> {
        let options = parse_cli_args(
            vec!["--print-config-path", "--print-example-config", "--check", "--demo"],
            default_options_path(),
        )?;
        assert!(options.print_config_path);
        assert!(options.print_example);
        assert!(options.check_only);
        assert!(options.demo);
        assert!(!options.show_help);
        Ok(())
    }

    #[test]
    fn selection_resolves_names_containing_slashes() -> Result<()> {
        let tree = demo_navigation_tree();
        assert_eq!(
            resolve_selection(&tree, "Vitals/Intake/Output")?,
            vec!["Vitals".to_owned(), "Intake/Output".to_owned()]
        );
        assert_eq!(resolve_selection(&tree, "Orders")?, vec!["Orders".to_owned()]);

        let error = resolve_selection(&tree, "Orders/Pending").expect_err("unknown child");
        assert!(error.to_string().contains("expected one of Active, Completed at level 1"));

        let error = resolve_selection(&tree, "Labs/Chem").expect_err("leaf has no children");
        assert!(error.to_string().contains("Labs has no sub-sections"));
        Ok(())
    }

    #[test]
    fn startup_view_rejects_unsortable_keys() -> Result<()> {
        let data = DemoSource::new(DEMO_SEED).load()?;
        let mut workspace = data.into_workspace(WorkspaceOptions::default())?;
        let options = parse_cli_args(vec!["--sort", "bed"], default_options_path())?;
        let error = apply_startup_view(&mut workspace, &options, None)
            .expect_err("bed is not sortable");
        assert!(error.to_string().contains("cannot sort Patients by \"bed\""));
        Ok(())
    }

    #[test]
    fn dump_renders_selected_view() -> Result<()> {
        let raw = r#"{
            "navigation": [{"name": "Labs"}, {"name": "Imaging"}],
            "sections": [{
                "path": ["Labs"],
                "fields": [
                    {"key": "id", "label": "ID", "searchable": false},
                    {"key": "test", "label": "Test"}
                ],
                "records": [
                    {"id": 1, "test": "Lipase"},
                    {"id": 2, "test": "CBC"},
                    {"id": 3, "test": "lactate"}
                ]
            }]
        }"#;
        let data = parse_workspace(raw, "labs.json")?;
        let tree = data.tree.clone();
        let mut workspace = data.into_workspace(WorkspaceOptions::default())?;
        let options = parse_cli_args(
            vec!["--search", "l", "--sort", "test"],
            default_options_path(),
        )?;
        apply_startup_view(&mut workspace, &options, Some(resolve_selection(&tree, "Labs")?))?;
        assert_eq!(
            render_dump(&workspace),
            "Labs\nID  Test ↑\n--  -------\n3   lactate\n1   Lipase\n2/3 rows | sort test asc | search \"l\"\n"
        );

        let options = parse_cli_args(Vec::<String>::new(), default_options_path())?;
        apply_startup_view(&mut workspace, &options, Some(resolve_selection(&tree, "Imaging")?))?;
        assert_eq!(render_dump(&workspace), "Imaging\nno data\n");
        Ok(())
    }

    #[test]
    fn check_report_lists_gaps() -> Result<()> {
        let raw = r#"{
            "navigation": [
                {"name": "Labs"},
                {"name": "Nursing", "children": [{"name": "Notes"}, {"name": "Skin"}]}
            ],
            "sections": [{
                "path": ["Labs"],
                "fields": [{"key": "test", "label": "Test"}, {"key": "ward", "label": "Ward"}],
                "records": [{"id": "a", "test": "CBC"}]
            }]
        }"#;
        let data = parse_workspace(raw, "ward.json")?;
        assert_eq!(
            check_report("ward.json", &data),
            "workspace ward.json: 1 sections, 1 records\nLabs: 1 records\n  warning: field \"ward\" is not present in any record\n  note: Nursing / Notes has no data\n  note: Nursing / Skin has no data\n"
        );
        Ok(())
    }
}
