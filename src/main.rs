use swing_screener::candles::CandleSeries;
use swing_screener::{analysis, comfy_table, config, find_tickers, klines};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config::load_or_default().await?;
    let client = reqwest::Client::builder()
        .pool_max_idle_per_host(50)
        .build()?;

    // Step 1: Fetch Metadata
    println!("\n--- Step 1: Fetching Exchange Info ---");
    let universe = match find_tickers::fetch_universe(
        &client,
        &config.api.base_url,
        &config.trading.quote_asset,
    )
    .await
    {
        Ok(universe) => universe,
        Err(e) => {
            eprintln!("Error fetching info: {}", e);
            return Err(e);
        }
    };

    let mut symbols = universe.symbols;
    if let Some(filter) = &config.trading.symbol_filter {
        let needle = filter.to_uppercase();
        symbols.retain(|s| s.contains(&needle));
    }
    if config.trading.max_symbols > 0 && symbols.len() > config.trading.max_symbols {
        symbols.truncate(config.trading.max_symbols);
    }
    println!("{} symbols to screen", symbols.len());

    // Step 2: Download Candles
    println!("\n--- Step 2: Fetching Klines ---");
    let fetched = klines::fetch_universe_series(
        &client,
        &config,
        &symbols,
        universe.weight_limit_per_minute,
    )
    .await;

    let mut series_list: Vec<CandleSeries> = Vec::with_capacity(fetched.len());
    for (symbol, result) in fetched {
        match result {
            Ok(series) => series_list.push(series),
            Err(e) => eprintln!("Skipping {}: {}", symbol, e),
        }
    }

    let with_series: Vec<String> = series_list
        .iter()
        .map(|s| s.symbol().to_string())
        .collect();
    let prices = klines::fetch_latest_prices(&client, &config, &with_series).await;
    let data: Vec<(CandleSeries, Option<f64>)> = series_list
        .into_iter()
        .zip(prices.into_iter().map(|(_, price)| price))
        .collect();

    // Step 3: Analyze Data
    println!("\n--- Step 3: Computing Swing Metrics ---");
    let report = analysis::build_report(&data, &config);
    println!(
        "{} complete records, {} symbols screened",
        report.metrics.len(),
        report.screened.len()
    );

    // Step 4: Display Results
    println!("\n--- Step 4: Displaying Table ---");
    comfy_table::render(&report, config.display.page_size);

    Ok(())
}
