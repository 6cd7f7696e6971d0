use crate::core::{
    aggregate::{collect_local, collect_pull_requests},
    config::{Settings, Toggle},
    deduce::deduce_inverted,
    dirs::get_repository_cache_directory,
    error::Result,
    facts::LocalFacts,
    git::{open_repository, GitRepo},
    github::{GhCli, ReviewTool},
    ignore::IgnoreFilter,
    indicators::IndicatorTable,
    output::{pager_command, Output},
    render::{render_json, render_text, RenderOptions},
    state::{BranchReport, PrCache, PR_CACHE_FILE},
    status::KeyOrder,
};
use clap::Args;
use std::env;
use std::io::{self, IsTerminal};

#[derive(Args, Debug, Default, Clone, PartialEq, Eq)]
pub struct ListArgs {
    /// Print branch timestamps and statuses as JSON
    #[arg(long)]
    pub json: bool,

    /// Colorize the output
    #[arg(
        long,
        value_enum,
        value_name = "WHEN",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "always"
    )]
    pub color: Option<Toggle>,

    /// Page the output even when stdout is not a terminal
    #[arg(long, overrides_with = "no_pager")]
    pub pager: bool,

    /// Never page the output
    #[arg(long, overrides_with = "pager")]
    pub no_pager: bool,

    /// List the most recent branch first
    #[arg(long)]
    pub reverse: bool,

    /// Gather pull request, review and CI statuses with `gh`
    #[arg(long, overrides_with = "no_pr")]
    pub pr: bool,

    /// Skip pull request statuses
    #[arg(long, overrides_with = "pr")]
    pub no_pr: bool,

    /// Link branch names to their pull requests
    #[arg(long)]
    pub link: bool,

    /// strftime format for the date column
    #[arg(long, value_name = "FORMAT")]
    pub date_format: Option<String>,
}

impl ListArgs {
    /// Flags take precedence over configuration
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(color) = self.color {
            settings.color = color;
        }
        if self.pager {
            settings.pager = Toggle::Always;
        } else if self.no_pager {
            settings.pager = Toggle::Never;
        }
        if self.reverse {
            settings.reverse = true;
        }
        if self.pr {
            settings.pull_requests = true;
        } else if self.no_pr {
            settings.pull_requests = false;
        }
        if self.link {
            settings.hyperlinks = true;
        }
        if let Some(format) = &self.date_format {
            settings.date_format = format.clone();
        }
    }
}

pub fn execute_list(args: ListArgs) -> Result<()> {
    let current_dir = env::current_dir()?;
    let git_repo = open_repository(&current_dir)?;

    let mut settings = Settings::load(&git_repo)?;
    args.apply(&mut settings);
    settings.validate()?;

    // Everything that can reject configuration runs before any output
    let order = KeyOrder::new(settings.pull_requests);
    let table = IndicatorTable::resolve(&order, &settings.indicators)?;
    let filter = IgnoreFilter::new(&order, &settings.ignore)?;

    let facts = git_repo.local_facts()?;
    let report = if settings.pull_requests {
        let tool = GhCli::new(git_repo.get_workdir());
        let mut cache = open_cache(&git_repo);
        let tool: &dyn ReviewTool = &tool;
        let report = assemble(&facts, &order, &filter, Some((tool, &mut cache)))?;
        if let Err(e) = cache.save() {
            log::warn!("{e}");
        }
        report
    } else {
        assemble(&facts, &order, &filter, None)?
    };

    if args.json {
        println!("{}", render_json(&report)?);
        return Ok(());
    }

    let is_terminal = io::stdout().is_terminal();
    let options = RenderOptions {
        color: settings.color.resolve(is_terminal),
        reverse: settings.reverse,
        hyperlinks: settings.hyperlinks,
        date_format: settings.date_format.clone(),
    };
    let text = render_text(&report, &order, &table, &options);

    let mut output = open_output(&git_repo, settings.pager, is_terminal)?;
    output.write(&text)?;
    output.finish()
}

/// Run the status pipeline over already gathered local facts: aggregate,
/// optionally add pull requests, deduce negatives, then filter.
pub fn assemble(
    facts: &LocalFacts,
    order: &KeyOrder,
    filter: &IgnoreFilter,
    pull_requests: Option<(&dyn ReviewTool, &mut PrCache)>,
) -> Result<BranchReport> {
    let mut report = collect_local(order, facts);

    if let Some((tool, cache)) = pull_requests {
        collect_pull_requests(&mut report, tool, cache)?;
    }

    let names = report.names();
    deduce_inverted(&mut report.matrix, order, names.iter().map(String::as_str));
    filter.apply(&mut report);

    log::debug!(
        "Assembled {} branches ({} hidden)",
        report.branches.len(),
        report.hidden.len()
    );
    Ok(report)
}

fn open_cache(git_repo: &GitRepo) -> PrCache {
    match get_repository_cache_directory(&git_repo.get_repo_path()) {
        Ok(dir) => PrCache::load(dir.join(PR_CACHE_FILE)),
        Err(e) => {
            log::warn!("Pull request cache disabled: {e}");
            PrCache::in_memory()
        }
    }
}

fn open_output(git_repo: &GitRepo, pager: Toggle, is_terminal: bool) -> Result<Output> {
    if !pager.resolve(is_terminal) {
        return Ok(Output::stdout());
    }
    let core_pager = git_repo.config_string("core.pager");
    match pager_command(core_pager.as_deref()) {
        Some(command) => Output::pager(&command, !is_terminal),
        None => Ok(Output::stdout()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::aggregate::tests::FakeReviewTool;
    use crate::core::error::BriefError;
    use crate::core::facts::{CheckoutEvent, TimingRecord, UpstreamRelation};
    use crate::core::ignore::{IgnoreRules, IgnoreScope};
    use crate::core::indicators::IndicatorOverride;
    use crate::core::status::Status;
    use clap::Parser;
    use std::collections::BTreeMap;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: ListArgs,
    }

    fn parse(argv: &[&str]) -> ListArgs {
        TestCli::parse_from(std::iter::once("git-brief").chain(argv.iter().copied())).args
    }

    /// `main` merged and in sync with its upstream, `feature` local only
    /// and checked out after its last commit
    fn two_branch_facts() -> LocalFacts {
        LocalFacts {
            current: None,
            timing: vec![
                TimingRecord::local("feature", 2000),
                TimingRecord::local("main", 1000).tracking(UpstreamRelation::Synced),
            ],
            checkouts: vec![CheckoutEvent::new(3000, "feature")],
            merged: vec!["main".to_string()],
            remotes: BTreeMap::from([("origin".to_string(), vec!["main".to_string()])]),
        }
    }

    fn no_filter(order: &KeyOrder) -> IgnoreFilter {
        IgnoreFilter::new(order, &IgnoreRules::new()).unwrap()
    }

    #[test]
    fn test_two_branch_pipeline() -> Result<()> {
        let order = KeyOrder::new(false);
        let report = assemble(&two_branch_facts(), &order, &no_filter(&order), None)?;
        let m = &report.matrix;

        assert_eq!(report.branches["feature"].effective_timestamp(), 3000);
        assert_eq!(report.branches["main"].effective_timestamp(), 1000);

        assert!(m.has(Status::Merged, "main"));
        assert!(m.has(Status::RemoteSynced, "main"));
        assert!(m.holds(Status::RemoteAhead.negative(), "main"));
        assert!(m.holds(Status::RemoteBehind.negative(), "main"));
        assert!(m.holds(Status::RemoteMixed.negative(), "main"));

        assert!(m.holds(Status::Merged.negative(), "feature"));
        assert!(m.holds(Status::RemoteTracking.negative(), "feature"));
        assert!(!m.holds(Status::RemoteSynced.negative(), "feature"));
        assert!(!m.has(Status::RemoteSynced, "feature"));

        let options = RenderOptions {
            date_format: "%s".to_string(),
            ..RenderOptions::default()
        };
        let table = IndicatorTable::defaults(&order)?;
        let text = render_text(&report, &order, &table, &options);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("1000\t"));
        assert!(lines[0].contains("main"));
        assert!(lines[1].starts_with("3000\t"));
        assert!(lines[1].contains("feature"));
        Ok(())
    }

    #[test]
    fn test_two_branch_json() -> Result<()> {
        let order = KeyOrder::new(false);
        let report = assemble(&two_branch_facts(), &order, &no_filter(&order), None)?;
        let json: serde_json::Value = serde_json::from_str(&render_json(&report)?)?;

        assert_eq!(json["branches"]["main"], 1000);
        assert_eq!(json["branches"]["feature"], 3000);
        let merged = json["statuses"]["merged"].as_array().unwrap();
        assert_eq!(merged, &[serde_json::json!("main")]);
        let non_tracking = json["statuses"]["non-remote-tracking"].as_array().unwrap();
        assert_eq!(non_tracking, &[serde_json::json!("feature")]);
        assert!(json["statuses"].get("pr-open").is_none());
        Ok(())
    }

    #[test]
    fn test_disabled_default_background_leaves_branch_unstyled() -> Result<()> {
        let order = KeyOrder::new(false);
        let report = assemble(&two_branch_facts(), &order, &no_filter(&order), None)?;
        let options = RenderOptions {
            color: true,
            date_format: "%s".to_string(),
            ..RenderOptions::default()
        };

        let defaults = IndicatorTable::defaults(&order)?;
        let styled = render_text(&report, &order, &defaults, &options);
        assert!(styled.contains("\x1b[48;2;58;58;58m1000"));

        let overrides = [IndicatorOverride::new(
            "brief.indicator.merged.bg",
            "merged.bg",
            "false",
        )];
        let table = IndicatorTable::resolve(&order, &overrides)?;
        let plain = render_text(&report, &order, &table, &options);
        assert!(!plain.contains("\x1b[48;2;"));
        Ok(())
    }

    #[test]
    fn test_pull_requests_flow_through_pipeline() -> Result<()> {
        let order = KeyOrder::new(true);
        let tool = FakeReviewTool::default().with_pr(
            "feature",
            "state:\tDRAFT\nreviewers:\t\nurl:\thttps://gh/pull/1\n",
        );
        let mut cache = PrCache::in_memory();
        let report = assemble(
            &two_branch_facts(),
            &order,
            &no_filter(&order),
            Some((&tool as &dyn ReviewTool, &mut cache)),
        )?;
        let m = &report.matrix;

        assert!(m.has(Status::PrDraft, "feature"));
        assert!(m.holds(Status::PrOpen.negative(), "feature"));
        assert!(m.has(Status::CiPending, "feature"));
        assert!(m.holds(Status::PrReviewAssigned.negative(), "feature"));
        assert!(m.holds(Status::PrAssociated.negative(), "main"));
        assert!(!m.holds(Status::PrOpen.negative(), "main"));
        assert!(!m.holds(Status::CiPass.negative(), "main"));
        assert!(cache.is_empty());
        Ok(())
    }

    #[test]
    fn test_broken_review_tool_aborts() {
        let order = KeyOrder::new(true);
        let tool = FakeReviewTool {
            broken: true,
            ..FakeReviewTool::default()
        };
        let mut cache = PrCache::in_memory();
        let result = assemble(
            &two_branch_facts(),
            &order,
            &no_filter(&order),
            Some((&tool as &dyn ReviewTool, &mut cache)),
        );
        assert!(matches!(
            result,
            Err(BriefError::ReviewToolUnavailable { .. })
        ));
    }

    #[test]
    fn test_ignore_all_hides_branch() -> Result<()> {
        let order = KeyOrder::new(false);
        let mut rules = IgnoreRules::new();
        rules.add(IgnoreScope::All, ["feature"]);
        let filter = IgnoreFilter::new(&order, &rules)?;
        let report = assemble(&two_branch_facts(), &order, &filter, None)?;

        let json: serde_json::Value = serde_json::from_str(&render_json(&report)?)?;
        assert!(json["branches"].get("feature").is_none());
        assert!(report
            .matrix
            .keys_for("feature")
            .next()
            .is_none());
        Ok(())
    }

    #[test]
    fn test_flags_parse() {
        assert_eq!(parse(&[]), ListArgs::default());
        assert_eq!(parse(&["--color"]).color, Some(Toggle::Always));
        assert_eq!(parse(&["--color=never"]).color, Some(Toggle::Never));

        let args = parse(&["--pager", "--no-pager", "--pr", "--date-format", "%F"]);
        assert!(args.no_pager);
        assert!(!args.pager);
        assert!(args.pr);
        assert_eq!(args.date_format.as_deref(), Some("%F"));
    }

    #[test]
    fn test_flags_override_settings() {
        let mut settings = Settings {
            pull_requests: true,
            pager: Toggle::Always,
            ..Settings::default()
        };
        parse(&["--no-pr", "--no-pager", "--color=always", "--reverse", "--link"])
            .apply(&mut settings);

        assert!(!settings.pull_requests);
        assert_eq!(settings.pager, Toggle::Never);
        assert_eq!(settings.color, Toggle::Always);
        assert!(settings.reverse);
        assert!(settings.hyperlinks);
    }
}
