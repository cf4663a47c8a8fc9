use clap::Parser;
use course_sheets::core::ConfigProvider;
use course_sheets::utils::error::ErrorSeverity;
use course_sheets::utils::{logger, validation::Validate};
use course_sheets::{CatalogError, CatalogLoader, CliConfig, CourseCatalog, HttpRangeFetcher};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match CliConfig::parse().resolve() {
        Ok(config) => config,
        Err(e) => exit_with(&e),
    };

    logger::init_logger(
        logger::LogFormat::from_json_flag(config.json_logs),
        config.verbose,
    );
    tracing::debug!("CLI config: {:?}", config);

    if let Err(e) = config.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        exit_with(&e);
    }

    let fetcher = match HttpRangeFetcher::from_config(&config) {
        Ok(fetcher) => fetcher,
        Err(e) => exit_with(&e),
    };
    let loader = CatalogLoader::new(fetcher, config.sheet_id());

    let catalog = match loader.load().await {
        Ok(catalog) => catalog,
        Err(e) => {
            tracing::error!("Catalog load failed: {} (severity: {:?})", e, e.severity());
            exit_with(&e);
        }
    };

    let output = render(&config, &catalog)?;
    println!("{}", output);
    Ok(())
}

/// Pretty JSON for whichever query the flags select; all matching courses otherwise.
fn render(config: &CliConfig, catalog: &CourseCatalog) -> serde_json::Result<String> {
    if let Some(slug) = &config.slug {
        return serde_json::to_string_pretty(&catalog.course_by_slug(slug));
    }
    if let Some(course_id) = &config.lessons {
        return serde_json::to_string_pretty(&catalog.lessons_for_course(course_id));
    }
    if config.categories {
        return serde_json::to_string_pretty(&catalog.categories());
    }
    serde_json::to_string_pretty(&catalog.filter_courses(&config.course_filter()))
}

fn exit_with(e: &CatalogError) -> ! {
    eprintln!("❌ {}", e.user_friendly_message());
    let code = match e.severity() {
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
    };
    std::process::exit(code)
}
