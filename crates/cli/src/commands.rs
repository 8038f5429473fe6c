//! Subcommand handlers. Results go to `out`; diagnostics go through tracing.

use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::{debug, error};

use mpcfill_core::{
    load_config_or_default, Candidate, FilenameFormat, MpcFillClient, SearchSettings,
    SearchSettingsOptions,
};

use crate::cli::{build_queries, Cli, Commands, FilterArgs, ListTarget};
use crate::output::{write_json, write_table, SearchRow};

/// Load the configuration, connect and run the selected subcommand.
pub async fn run<W: Write>(cli: Cli, out: &mut W) -> Result<()> {
    let config =
        load_config_or_default(cli.config.as_deref()).with_context(|| match &cli.config {
            Some(path) => format!("Failed to load config from {:?}", path),
            None => "Failed to load config from environment".to_string(),
        })?;
    debug!(base_url = %config.client.base_url, "Configuration loaded");

    let client = MpcFillClient::new(config).context("Failed to create client")?;
    execute(&client, cli.command, out).await
}

pub async fn execute<W: Write>(
    client: &MpcFillClient,
    command: Commands,
    out: &mut W,
) -> Result<()> {
    match command {
        Commands::Search {
            query,
            filters,
            json,
        } => search(client, &query, &filters, json, out).await,
        Commands::Download {
            query,
            dest,
            filters,
            threads,
        } => download(client, &query, &dest, &filters, threads, out).await,
        Commands::List { what } => list(client, what, out).await,
    }
}

/// Settings from config defaults overridden by flags.
///
/// Sources are disabled first, then preferred sources are enabled and
/// ranked in the order given.
async fn build_settings(client: &MpcFillClient, filters: &FilterArgs) -> Result<SearchSettings> {
    let defaults = &client.config().search;
    let options = SearchSettingsOptions {
        minimum_dpi: filters.minimum_dpi.unwrap_or(defaults.minimum_dpi),
        maximum_dpi: filters.maximum_dpi.unwrap_or(defaults.maximum_dpi),
        maximum_size: filters.maximum_size.unwrap_or(defaults.maximum_size),
        fuzzy_search: filters.fuzzy || defaults.fuzzy_search,
        filter_cardbacks: filters.filter_cardbacks || defaults.filter_cardbacks,
        languages: filters.languages.clone(),
        includes_tags: filters.include_tags.clone(),
        excludes_tags: Some(filters.exclude_tags.clone()),
    };

    let mut settings = client
        .settings_with(options)
        .await
        .context("Failed to fetch sources")?;

    if !settings.languages().is_empty() {
        let languages = client
            .list_languages()
            .await
            .context("Failed to fetch languages")?;
        settings.resolve_languages(&languages)?;
    }

    if !settings.includes_tags().is_empty() || !settings.excludes_tags().is_empty() {
        let tags = client.list_tags().await.context("Failed to fetch tags")?;
        settings.check_tags(&tags)?;
    }

    for key in &filters.disable_sources {
        settings.disable_source(key.as_str())?;
    }
    for (position, key) in filters.prefer_sources.iter().enumerate() {
        settings.enable_source(key.as_str())?;
        settings.set_source_priority(key.as_str(), position as isize)?;
    }

    Ok(settings)
}

/// Best candidate of every matched group.
async fn search_best(
    client: &MpcFillClient,
    query: &[String],
    filters: &FilterArgs,
) -> Result<Vec<Candidate>> {
    let settings = build_settings(client, filters).await?;
    let groups = client
        .search(build_queries(query), &settings, !filters.no_backs)
        .await
        .context("Search failed")?;
    Ok(groups.iter().map(|group| group.best().clone()).collect())
}

async fn search<W: Write>(
    client: &MpcFillClient,
    query: &[String],
    filters: &FilterArgs,
    json: bool,
    out: &mut W,
) -> Result<()> {
    let best = search_best(client, query, filters).await?;
    if best.is_empty() {
        return Ok(());
    }

    let rows: Vec<SearchRow> = best.iter().map(SearchRow::from).collect();
    if json {
        write_json(out, &rows)?;
    } else {
        let cells: Vec<Vec<String>> = rows.iter().map(SearchRow::cells).collect();
        write_table(out, &SearchRow::HEADERS, &cells)?;
    }
    Ok(())
}

async fn download<W: Write>(
    client: &MpcFillClient,
    query: &[String],
    dest: &Path,
    filters: &FilterArgs,
    threads: Option<usize>,
    out: &mut W,
) -> Result<()> {
    let best = search_best(client, query, filters).await?;
    let total = best.len();
    let threads = threads.unwrap_or(client.config().download.threads);
    let format = FilenameFormat::new(client.config().download.filename_format.clone());

    let mut failed = 0;
    for outcome in client.download_candidates(best, dest, &format, threads).await {
        match outcome.result {
            Ok(path) => writeln!(out, "{}", path.display())?,
            Err(e) => {
                failed += 1;
                error!(identifier = %outcome.identifier, error = %e, "Download failed");
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} downloads failed", failed, total);
    }
    Ok(())
}

async fn list<W: Write>(client: &MpcFillClient, what: ListTarget, out: &mut W) -> Result<()> {
    match what {
        ListTarget::Sources => {
            let sources = client.list_sources().await.context("Failed to fetch sources")?;
            let rows: Vec<Vec<String>> = sources
                .iter()
                .map(|s| vec![s.pk.to_string(), s.name.clone()])
                .collect();
            write_table(out, &["ID", "Name"], &rows)?;
        }
        ListTarget::Languages => {
            let languages = client
                .list_languages()
                .await
                .context("Failed to fetch languages")?;
            let rows: Vec<Vec<String>> = languages
                .iter()
                .map(|l| vec![l.code.clone(), l.name.clone()])
                .collect();
            write_table(out, &["Code", "Name"], &rows)?;
        }
        ListTarget::Tags => {
            let tags = client.list_tags().await.context("Failed to fetch tags")?;
            write!(out, "{}", tags.render_tree())?;
        }
        ListTarget::Dfcs => {
            let dfcs = client.list_dfcs().await.context("Failed to fetch DFC pairs")?;
            let rows: Vec<Vec<String>> = dfcs
                .iter()
                .map(|(front, back)| vec![front.to_string(), back.to_string()])
                .collect();
            write_table(out, &["Front", "Back"], &rows)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use serde_json::json;
    use tempfile::TempDir;

    use mpcfill_core::testing::{fixtures, MockTransport};
    use mpcfill_core::{CardType, Config, SettingsError};

    const SEARCH: &str = "/2/editorSearch/";

    async fn client() -> (Arc<MockTransport>, MpcFillClient) {
        let transport = Arc::new(MockTransport::new());
        transport
            .set_get("/2/sources/", fixtures::sources_response())
            .await;
        transport
            .set_get("/2/languages/", fixtures::languages_response())
            .await;
        transport.set_get("/2/tags/", fixtures::tags_response()).await;
        transport
            .set_get("/2/DFCPairs", fixtures::dfc_pairs_response())
            .await;
        transport
            .set_post(
                SEARCH,
                fixtures::editor_search_response(&[
                    (CardType::Card, "bayou", &["id1", "id2"][..]),
                    (CardType::Token, "treasure", &["tok"][..]),
                ]),
            )
            .await;
        transport
            .set_post(
                "/2/cards/",
                fixtures::cards_response(&[
                    fixtures::card_json("id1", "Bayou", CardType::Card, "bayou", 2),
                    fixtures::card_json("id2", "Bayou", CardType::Card, "bayou", 1),
                    fixtures::card_json("tok", "Treasure", CardType::Token, "treasure", 0),
                ]),
            )
            .await;
        let client = MpcFillClient::with_transport(transport.clone(), Config::default());
        (transport, client)
    }

    fn filters() -> FilterArgs {
        FilterArgs {
            no_backs: true,
            ..FilterArgs::default()
        }
    }

    async fn run_to_string(client: &MpcFillClient, command: Commands) -> Result<String> {
        let mut out = Vec::new();
        execute(client, command, &mut out).await?;
        Ok(String::from_utf8(out)?)
    }

    #[tokio::test]
    async fn test_search_prints_table() {
        let (_, client) = client().await;
        let output = run_to_string(
            &client,
            Commands::Search {
                query: vec!["Bayou".to_string(), "t:Treasure".to_string()],
                filters: filters(),
                json: false,
            },
        )
        .await
        .unwrap();

        let expected = "\
Type   Name      ID
-----  --------  ---
CARD   Bayou     id2
TOKEN  Treasure  tok
";
        assert_eq!(output, expected);
    }

    #[tokio::test]
    async fn test_search_prints_json() {
        let (transport, client) = client().await;
        let output = run_to_string(
            &client,
            Commands::Search {
                query: vec!["Bayou".to_string()],
                filters: filters(),
                json: true,
            },
        )
        .await
        .unwrap();

        let rows: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(rows[0], json!({"Type": "CARD", "Name": "Bayou", "ID": "id2"}));

        // No back faces and no tags requested
        assert_eq!(transport.calls_to("/2/DFCPairs").await, 0);
        assert_eq!(transport.calls_to("/2/tags/").await, 0);
    }

    #[tokio::test]
    async fn test_empty_search_prints_nothing() {
        let (transport, client) = client().await;
        transport.set_post(SEARCH, json!({"results": {}})).await;
        let output = run_to_string(
            &client,
            Commands::Search {
                query: vec!["Nothing".to_string()],
                filters: filters(),
                json: true,
            },
        )
        .await
        .unwrap();
        assert!(output.is_empty());
    }

    #[tokio::test]
    async fn test_flags_shape_settings_payload() {
        let (transport, client) = client().await;
        let args = FilterArgs {
            languages: vec!["english".to_string()],
            include_tags: vec!["FULL_ART".to_string(), "Borderless".to_string()],
            minimum_dpi: Some(-5),
            maximum_size: Some(50),
            fuzzy: true,
            disable_sources: vec!["Chilli_Axe".to_string(), "ILikeIt".to_string()],
            prefer_sources: vec!["ILikeIt".to_string()],
            ..filters()
        };
        run_to_string(
            &client,
            Commands::Search {
                query: vec!["Bayou".to_string()],
                filters: args,
                json: false,
            },
        )
        .await
        .unwrap();

        let body = &transport.posted_bodies(SEARCH).await[0]["searchSettings"];
        assert_eq!(body["searchTypeSettings"]["fuzzySearch"], json!(true));
        assert_eq!(
            body["sourceSettings"]["sources"],
            json!([[2, true], [1, false], [3, true]])
        );
        let filter = &body["filterSettings"];
        assert_eq!(filter["minimumDPI"], json!(0));
        assert_eq!(filter["maximumDPI"], json!(1500));
        assert_eq!(filter["maximumSize"], json!(30));
        assert_eq!(filter["languages"], json!(["EN"]));
        assert_eq!(filter["includesTags"], json!(["Full-Art"]));
        assert_eq!(filter["excludesTags"], json!([]));
    }

    #[tokio::test]
    async fn test_unknown_inputs_are_rejected() {
        let (transport, client) = client().await;

        let unknown_source = FilterArgs {
            prefer_sources: vec!["Nobody".to_string()],
            ..filters()
        };
        let err = search_best(&client, &["Bayou".to_string()], &unknown_source)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SettingsError>(),
            Some(SettingsError::UnknownSource(_))
        ));

        let unknown_tag = FilterArgs {
            exclude_tags: vec!["Not A Tag".to_string()],
            ..filters()
        };
        let err = search_best(&client, &["Bayou".to_string()], &unknown_tag)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SettingsError>(),
            Some(SettingsError::UnknownTag(_))
        ));

        let unknown_language = FilterArgs {
            languages: vec!["Klingon".to_string()],
            ..filters()
        };
        let err = search_best(&client, &["Bayou".to_string()], &unknown_language)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SettingsError>(),
            Some(SettingsError::UnknownLanguage(_))
        ));

        assert_eq!(transport.calls_to(SEARCH).await, 0);
    }

    #[tokio::test]
    async fn test_download_prints_written_paths() {
        let (transport, client) = client().await;
        for id in ["id2", "tok"] {
            transport
                .set_raw(&fixtures::download_link(id), id.as_bytes().to_vec())
                .await;
        }
        let temp = TempDir::new().unwrap();

        let output = run_to_string(
            &client,
            Commands::Download {
                query: vec!["Bayou".to_string(), "t:Treasure".to_string()],
                dest: temp.path().to_path_buf(),
                filters: filters(),
                threads: None,
            },
        )
        .await
        .unwrap();

        let bayou = temp.path().join("0_Bayou.png");
        let treasure = temp.path().join("1_Treasure.png");
        assert_eq!(
            output,
            format!("{}\n{}\n", bayou.display(), treasure.display())
        );
        assert_eq!(std::fs::read(treasure).unwrap(), b"tok");
    }

    #[tokio::test]
    async fn test_download_failures_fail_the_command() {
        let (transport, client) = client().await;
        transport
            .set_raw(&fixtures::download_link("id2"), b"id2".to_vec())
            .await;
        let temp = TempDir::new().unwrap();

        let mut out = Vec::new();
        let err = execute(
            &client,
            Commands::Download {
                query: vec!["Bayou".to_string(), "t:Treasure".to_string()],
                dest: temp.path().to_path_buf(),
                filters: filters(),
                threads: Some(2),
            },
            &mut out,
        )
        .await
        .unwrap_err();

        assert_eq!(err.to_string(), "1 of 2 downloads failed");
        assert!(temp.path().join("0_Bayou.png").exists());
    }

    #[tokio::test]
    async fn test_list_tables() {
        let (_, client) = client().await;

        let sources = run_to_string(&client, Commands::List { what: ListTarget::Sources })
            .await
            .unwrap();
        assert_eq!(
            sources.lines().collect::<Vec<_>>(),
            vec![
                "ID  Name",
                "--  ----------------",
                "1   Chilli_Axe",
                "2   ILikeIt",
                "3   Hathwellcrisping",
            ]
        );

        let languages = run_to_string(&client, Commands::List { what: ListTarget::Languages })
            .await
            .unwrap();
        assert!(languages.starts_with("Code  Name\n----  --------\nEN    English\n"));

        let dfcs = run_to_string(&client, Commands::List { what: ListTarget::Dfcs })
            .await
            .unwrap();
        assert!(dfcs.contains("Delver of Secrets  Insectile Aberration"));
    }

    #[tokio::test]
    async fn test_list_tags_tree() {
        let (_, client) = client().await;
        let output = run_to_string(&client, Commands::List { what: ListTarget::Tags })
            .await
            .unwrap();
        let expected = "\
├── Full-Art
│   ├── Extended Art
│   └── Borderless
└── NSFW
";
        assert_eq!(output, expected);
    }
}
