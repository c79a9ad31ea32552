use anyhow::Context;
use clap::Parser;
use profit_engine::adapters::cost_import::read_cost_lines_from_file;
use profit_engine::utils::{logger, validation::Validate};
use profit_engine::{
    load_rates, CliArgs, CommissionSource, EditorState, EngineConfig, FinancialSnapshot,
    FinancialSnapshotAssembler, ProfitabilitySolver, ProjectFile, ProjectSession,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // 載入引擎配置
    let config = match EngineConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config.display(), e);
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    // 初始化日誌
    let verbose = args.verbose || config.logging.verbose.unwrap_or(false);
    logger::init_logger(verbose, config.logging.json.unwrap_or(false));

    tracing::info!("🚀 Starting profit-engine");

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    let project = ProjectFile::from_file(&args.project)
        .with_context(|| format!("loading project file {}", args.project.display()))?;
    if let Err(e) = project.validate() {
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    let mut ledger = project.ledger();
    if let Some(csv_path) = &args.costs_csv {
        let imported = read_cost_lines_from_file(csv_path, ledger.next_id())
            .with_context(|| format!("importing costs from {}", csv_path.display()))?;
        tracing::info!("📥 Imported {} cost lines from CSV", imported.len());
        for line in imported {
            ledger.add_or_update(line);
        }
    }

    let settings = config.build_settings_source();
    let rates = load_rates(&*settings).await;

    let mut solver = ProfitabilitySolver::new(config.build_resolver()?);
    if let Some(timeout) = config.resolve_timeout() {
        solver = solver.with_resolve_timeout(timeout);
    }

    let state = EditorState {
        ledger,
        rates,
        revenue: project.revenue(),
        role_id: project.project.role_id.clone(),
        manual_commission_percent: args
            .manual_commission
            .or(project.project.manual_commission_percent),
        notes: String::new(),
    };
    let session = ProjectSession::new(
        project.project.name.clone(),
        FinancialSnapshotAssembler::new(solver),
        state,
    );

    session.refresh().await;
    let snapshot = session
        .current()
        .context("no snapshot was published for the project")?;

    if !snapshot.converged {
        tracing::warn!("⚠️ Commission did not converge; the last computed bracket was used");
    }
    if snapshot.resolver_degraded {
        tracing::warn!("⚠️ Bracket lookups failed during the solve; failed lookups counted as 0%");
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        display_snapshot(session.project(), &snapshot);
    }

    Ok(())
}

fn display_snapshot(name: &str, s: &FinancialSnapshot) {
    let source = match s.commission_source {
        CommissionSource::Automatic => "automatic",
        CommissionSource::Manual => "manual",
    };

    println!("📊 {}", name);
    println!("  Revenue                 {:>16}", s.revenue.round_dp(2));
    println!("  Costs (VAT base)        {:>16}", s.cost_subtotal_taxed.round_dp(2));
    println!("  Costs (withholding)     {:>16}", s.cost_subtotal_withholding.round_dp(2));
    println!("  Costs (net)             {:>16}", s.cost_subtotal_net.round_dp(2));
    println!("  VAT                     {:>16}", s.vat_amount.round_dp(2));
    println!("  Withholding             {:>16}", s.withholding_amount.round_dp(2));
    println!("  PPM                     {:>16}", s.ppm_amount.round_dp(2));
    println!("  Admin expense           {:>16}", s.admin_expense_amount.round_dp(2));
    println!("  Cash reserve            {:>16}", s.cash_reserve_amount.round_dp(2));
    println!(
        "  Commission ({}, {}%)  {:>16}",
        source,
        s.commission_percent.round_dp(2),
        s.commission_amount.round_dp(2)
    );
    println!("  Total cost              {:>16}", s.total_cost.round_dp(2));
    println!("  Net profit              {:>16}", s.net_profit.round_dp(2));
    println!("  Net margin              {:>15}%", s.net_margin_percent.round_dp(2));
    println!(
        "  Converged: {} after {} pass(es)",
        if s.converged { "yes" } else { "no" },
        s.iterations
    );
    if !s.defaulted_settings.is_empty() {
        let keys: Vec<_> = s.defaulted_settings.iter().map(|k| k.as_str()).collect();
        println!("  ⚠️ Settings defaulted to 0: {}", keys.join(", "));
    }
}
