use km_life_table::{ColumnSpec, ConfidenceType, Frame, LifeTableModel};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("Kaplan-Meier Life Table - Basic Usage Example");
    println!("=============================================\n");

    // time to relapse (months), 1 = relapsed, 0 = censored
    let months = vec![6.0, 6.0, 6.0, 7.0, 10.0, 13.0, 16.0, 22.0, 23.0, 6.0,
                      9.0, 10.0, 11.0, 17.0, 19.0, 20.0, 25.0, 32.0, 32.0, 34.0,
                      1.0, 1.0, 2.0, 2.0, 3.0, 4.0, 4.0, 5.0, 5.0, 8.0,
                      8.0, 8.0, 8.0, 11.0, 11.0, 12.0, 12.0, 15.0, 17.0, 22.0];
    let status = vec![1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 0.0,
                      0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
                      1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0,
                      1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0];
    let arm: Vec<&str> = (0..40).map(|i| if i < 20 { "6-MP" } else { "placebo" }).collect();

    let frame = Frame::new()
        .with_column("months", months)
        .with_column("relapse", status)
        .with_column("arm", arm);
    let spec = ColumnSpec::new("months", "relapse").with_strata("arm");

    let model = LifeTableModel::new()
        .with_conf_level(95.0)
        .with_conf_type(ConfidenceType::LogLog);
    let table = model.fit_frame(&frame, &spec)?;

    println!("{}", table.column_names().join("  "));
    println!("{:-<110}", "");
    for row in table.life_table_rows() {
        let life = row.life.unwrap_or(km_life_table::LifeTableRow::NOT_APPLICABLE);
        println!(
            "{:>5.1} {:>4} {:>4} {:>4} {:>6.3} {:>6.3} {:>6.3} {:>6.3} {:>6.3} {:<8} {:>6.3} {:>6.3} {:>6.2} {:>6.2} {:>6.3}",
            row.time, row.n_risk, row.n_censored, row.n_events,
            row.survival, row.std_err, row.lower, row.upper, row.cum_hazard,
            row.group.unwrap_or("-"),
            life.hazard, life.density, life.mid_int, life.life, life.proplife,
        );
    }
    println!();

    model.summary(&table).print();
    println!();

    println!("as json for a plotting tool:");
    println!("{}", serde_json::to_string(&table)?);

    Ok(())
}
