use profit_engine::adapters::cost_import::read_cost_lines_from_file;
use profit_engine::utils::validation::Validate;
use profit_engine::{
    load_rates, BracketTable, CommissionBracket, CommissionSource, CostLedger, CostLine,
    EditorState, EngineConfig, FinancialSnapshotAssembler, ProfitabilitySolver, ProjectFile,
    ProjectSession, Recompute, RoleId, SurchargeRates,
};
use rust_decimal_macros::dec;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

fn seventy_percent_table() -> BracketTable {
    BracketTable::new(vec![
        CommissionBracket {
            margin_low: dec!(70),
            margin_high: dec!(100),
            role_id: RoleId::new("sales"),
            commission_percent: dec!(5),
        },
        CommissionBracket {
            margin_low: dec!(0),
            margin_high: dec!(69.9999),
            role_id: RoleId::new("sales"),
            commission_percent: dec!(2),
        },
    ])
}

fn vat_only_rates() -> SurchargeRates {
    SurchargeRates {
        vat_rate: dec!(19),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_reference_quote_converges_at_second_pass() {
    let ledger = CostLedger::from_lines(vec![CostLine::new(1, "Arriendo sala", dec!(200000)).with_vat()]);
    let assembler = FinancialSnapshotAssembler::new(ProfitabilitySolver::new(seventy_percent_table()));

    let snapshot = assembler
        .compute_snapshot(
            &ledger,
            &vat_only_rates(),
            dec!(1000000),
            Some(&RoleId::new("sales")),
            None,
        )
        .await;

    assert_eq!(snapshot.vat_amount, dec!(38000));
    assert_eq!(snapshot.costs_excluding_commission, dec!(238000));
    assert_eq!(snapshot.commission_percent, dec!(5));
    assert_eq!(snapshot.commission_amount, dec!(50000));
    assert_eq!(snapshot.net_margin_percent, dec!(71.2));
    assert_eq!(snapshot.iterations, 2);
    assert!(snapshot.converged);
    assert_eq!(snapshot.commission_source, CommissionSource::Automatic);
}

#[tokio::test]
async fn test_manual_override_ignores_bracket_table() {
    let ledger = CostLedger::from_lines(vec![CostLine::new(1, "Arriendo sala", dec!(200000)).with_vat()]);
    let assembler = FinancialSnapshotAssembler::new(ProfitabilitySolver::new(seventy_percent_table()));

    let snapshot = assembler
        .compute_snapshot(
            &ledger,
            &vat_only_rates(),
            dec!(1000000),
            Some(&RoleId::new("sales")),
            Some(dec!(8)),
        )
        .await;

    assert_eq!(snapshot.commission_source, CommissionSource::Manual);
    assert_eq!(snapshot.commission_amount, dec!(80000));
    assert_eq!(snapshot.iterations, 0);
    assert_eq!(snapshot.net_margin_percent, dec!(68.2));
}

#[tokio::test]
async fn test_session_toggle_vat_to_withholding() {
    let state = EditorState {
        ledger: CostLedger::from_lines(vec![CostLine::new(1, "Relator", dec!(200000)).with_vat()]),
        rates: SurchargeRates {
            vat_rate: dec!(19),
            withholding_rate: dec!(10),
            ..Default::default()
        },
        revenue: dec!(1000000),
        role_id: Some(RoleId::new("sales")),
        ..Default::default()
    };
    let session = ProjectSession::new(
        "P-100",
        FinancialSnapshotAssembler::new(ProfitabilitySolver::new(seventy_percent_table())),
        state,
    );

    let Recompute::Published(before) = session.refresh().await else {
        panic!("first refresh must publish");
    };
    assert_eq!(before.vat_amount, dec!(38000));

    assert!(session.set_applies_withholding(1, true));
    let line = session.state().ledger.get(1).cloned().unwrap();
    assert!(line.applies_withholding);
    assert!(!line.applies_vat);

    let Recompute::Published(after) = session.refresh().await else {
        panic!("toggle must republish");
    };
    assert_eq!(after.vat_amount, dec!(0));
    assert_eq!(after.withholding_amount, dec!(20000));
    assert_eq!(after.costs_excluding_commission, dec!(220000));
    // 78% -> 5% -> 73% -> 5%
    assert_eq!(after.commission_percent, dec!(5));
    assert_eq!(after.net_margin_percent, dec!(73));
}

#[tokio::test]
async fn test_files_to_snapshot() {
    let dir = TempDir::new().unwrap();

    let config_path = dir.path().join("engine.toml");
    std::fs::write(
        &config_path,
        r#"
[resolver]
type = "table"

[[resolver.brackets]]
margin_low = 70
margin_high = 100
role_id = "sales"
commission_percent = 5

[settings.values]
vat_rate = 19
"#,
    )
    .unwrap();

    let project_path = dir.path().join("project.toml");
    std::fs::write(
        &project_path,
        r#"
[project]
name = "Curso Excel ACME"
role_id = "sales"

[[courses]]
course = "Excel Intermedio"
quantity = 20
unit_price = 50000

[[costs]]
id = 1
concept = "Arriendo sala"
amount = 150000
applies_vat = true
"#,
    )
    .unwrap();

    let mut csv = NamedTempFile::new_in(dir.path()).unwrap();
    writeln!(csv, "concept,amount,applies_vat,applies_withholding").unwrap();
    writeln!(csv, "Manuales,50000,true,false").unwrap();

    let config = EngineConfig::from_file(&config_path).unwrap();
    config.validate().unwrap();
    let project = ProjectFile::from_file(&project_path).unwrap();
    project.validate().unwrap();

    let mut ledger = project.ledger();
    for line in read_cost_lines_from_file(csv.path(), ledger.next_id()).unwrap() {
        ledger.add_or_update(line);
    }
    assert_eq!(ledger.len(), 2);

    let settings = config.build_settings_source();
    let rates = load_rates(&*settings).await;
    assert_eq!(rates.defaulted.len(), 4);

    let assembler =
        FinancialSnapshotAssembler::new(ProfitabilitySolver::new(config.build_resolver().unwrap()));
    let snapshot = assembler
        .compute_snapshot(
            &ledger,
            &rates,
            project.revenue(),
            project.project.role_id.as_ref(),
            None,
        )
        .await;

    assert_eq!(snapshot.revenue, dec!(1000000));
    assert_eq!(snapshot.cost_subtotal_taxed, dec!(200000));
    assert_eq!(snapshot.commission_amount, dec!(50000));
    assert_eq!(snapshot.net_margin_percent, dec!(71.2));
    assert_eq!(snapshot.defaulted_settings.len(), 4);

    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json["commission_source"], "automatic");
    assert_eq!(json["converged"], true);
}
