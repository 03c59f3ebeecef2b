use crate::infra::lead_service;
use chrono::Local;
use clap::Args;
use opportunity_insights::config::AppConfig;
use opportunity_insights::error::AppError;
use opportunity_insights::insights::{generate, OpportunityCatalog, OpportunityMetrics};
use opportunity_insights::leads::LeadRecord;
use opportunity_insights::telemetry;
use std::fmt::Write as _;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct InsightsArgs {
    /// Catalog category, e.g. "Home & Kitchen"
    #[arg(long)]
    pub(crate) category: String,
    /// Product within the category
    #[arg(long)]
    pub(crate) product: String,
    /// Print the metrics as JSON instead of a table
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct CatalogArgs {
    /// Market slug naming the catalog file (e.g. usa)
    #[arg(long, default_value = "usa")]
    pub(crate) market: String,
    /// Catalog directory (defaults to CATALOG_DIR)
    #[arg(long)]
    pub(crate) dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct LeadsListArgs {
    /// Admin token guarding lead access
    #[arg(long)]
    pub(crate) token: String,
    /// Print the stored records as JSON (oldest first)
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct LeadsExportArgs {
    /// Admin token guarding lead access
    #[arg(long)]
    pub(crate) token: String,
    /// Destination file; stdout when omitted
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
}

pub(crate) fn run_insights(args: InsightsArgs) -> Result<(), AppError> {
    let metrics = generate(&args.category, &args.product);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&metrics)?);
    } else {
        print!("{}", render_insights(&metrics));
    }
    Ok(())
}

pub(crate) fn run_catalog(args: CatalogArgs) -> Result<(), AppError> {
    let dir = match args.dir {
        Some(dir) => dir,
        None => AppConfig::load()?.catalog.dir,
    };
    let catalog = OpportunityCatalog::load_market(&dir, &args.market)?;

    if catalog.is_empty() {
        println!("Catalog '{}' has no opportunities", args.market);
        return Ok(());
    }

    println!("Catalog '{}' ({} opportunities)", args.market, catalog.rows().len());
    for listing in catalog.listings() {
        println!("\n{}", listing.category);
        for product in listing.products {
            println!("- {product}");
        }
    }
    Ok(())
}

pub(crate) fn run_leads_list(args: LeadsListArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let leads = lead_service(&config).list(&args.token)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&leads)?);
    } else {
        print!("{}", render_leads(&leads));
    }
    Ok(())
}

pub(crate) fn run_leads_export(args: LeadsExportArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    let service = lead_service(&config);

    let written = match &args.output {
        Some(path) => {
            let file = std::fs::File::create(path)?;
            service.export_csv(&args.token, file)?
        }
        None => service.export_csv(&args.token, std::io::stdout().lock())?,
    };

    if let Some(path) = &args.output {
        eprintln!("Exported {written} leads to {}", path.display());
    }
    Ok(())
}

fn render_insights(metrics: &OpportunityMetrics) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} / {}", metrics.category, metrics.product);
    let _ = writeln!(out, "Consumer demand:      {}", metrics.demand_score);
    let _ = writeln!(out, "Growth potential:     {}", metrics.growth_score);
    let _ = writeln!(out, "Competition:          {}", metrics.competition_score);
    let _ = writeln!(out, "Unit economics:       {}", metrics.unit_economics_score);
    let _ = writeln!(out, "Differentiation:      {}", metrics.differentiation_score);
    let _ = writeln!(out, "Compliance risk:      {}", metrics.compliance_risk_score);
    let _ = writeln!(
        out,
        "Price range:          ${} - ${}",
        metrics.min_price, metrics.max_price
    );
    let _ = writeln!(out, "Monthly searches:     {}", metrics.search_volume);
    let _ = writeln!(out, "Revenue potential:    ${}", metrics.revenue_potential);
    out
}

fn render_leads(leads: &[LeadRecord]) -> String {
    if leads.is_empty() {
        return "No leads captured yet\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(out, "{} leads (newest first)", leads.len());
    for lead in leads.iter().rev() {
        let submitted = lead.submitted_at.with_timezone(&Local);
        let _ = writeln!(
            out,
            "- {} | {} <{}> | {} | {} | {}",
            submitted.format("%Y-%m-%d %H:%M"),
            lead.name,
            lead.email,
            lead.phone,
            lead.product,
            lead.country_of_interest
        );
    }
    out
}
