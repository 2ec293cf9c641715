//! Terminal rendering for command results.

use pixstake_common::{ActionFlow, AssetRef, StakedAsset};
use pixstake_core::{ActionReport, RewardCalculator};
use serde_json::{json, Value};

fn flow_label(flow: ActionFlow) -> &'static str {
    match flow {
        ActionFlow::Stake => "Staked",
        ActionFlow::Unstake => "Unstaked",
        ActionFlow::Claim => "Claimed",
    }
}

fn asset_json(asset: &AssetRef) -> Value {
    json!({
        "mint": asset.mint.to_string(),
        "metadata": asset.metadata_address.to_string(),
        "name": asset.name,
        "symbol": asset.symbol,
        "uri": asset.uri,
        "image": asset.image,
    })
}

pub fn staked(assets: &[StakedAsset], calculator: &RewardCalculator, as_json: bool) {
    let total = calculator.total_expected_interest(assets);
    if as_json {
        let items: Vec<Value> = assets
            .iter()
            .map(|staked| {
                let mut item = asset_json(&staked.asset);
                item["stakingPeriod"] = json!(staked.staking_period);
                item["expectedInterest"] = json!(staked.expected_interest.to_string());
                item["currentInterest"] = json!(staked.current_interest.to_string());
                item
            })
            .collect();
        println!(
            "{}",
            json!({ "assets": items, "totalExpectedInterest": total.to_string() })
        );
        return;
    }

    if assets.is_empty() {
        println!("No staked assets");
        return;
    }
    println!("{:<44}  {:<20}  {:>5}  {:>14}  {:>14}", "MINT", "NAME", "DAYS", "EXPECTED", "CLAIMABLE");
    for staked in assets {
        println!(
            "{:<44}  {:<20}  {:>5}  {:>14}  {:>14}",
            staked.asset.mint.to_string(),
            staked.asset.name,
            staked.staking_period,
            staked.expected_interest.to_string(),
            staked.current_interest.to_string(),
        );
    }
    println!("Total expected interest: {}", total);
}

pub fn wallet(assets: &[AssetRef], as_json: bool) {
    if as_json {
        let items: Vec<Value> = assets.iter().map(asset_json).collect();
        println!("{}", json!({ "assets": items }));
        return;
    }

    if assets.is_empty() {
        println!("No collection assets in this wallet");
        return;
    }
    for asset in assets {
        println!(
            "{}  {}  {}",
            asset.mint,
            asset.name,
            asset.image.as_deref().unwrap_or("-")
        );
    }
}

pub fn reward_table(calculator: &RewardCalculator, days: u64, as_json: bool) {
    let rows: Vec<(u64, String)> = (1..=days)
        .map(|day| (day, calculator.total_reward_for_days(day).to_string()))
        .collect();

    if as_json {
        let items: Vec<Value> = rows
            .iter()
            .map(|(day, total)| json!({ "day": day, "total": total }))
            .collect();
        println!("{}", Value::Array(items));
        return;
    }
    println!("{:>5}  {:>14}", "DAY", "TOTAL");
    for (day, total) in rows {
        println!("{:>5}  {:>14}", day, total);
    }
}

pub fn report(report: &ActionReport, as_json: bool) {
    let signatures: Vec<String> = report.signatures.iter().map(|s| s.to_string()).collect();
    if as_json {
        let failure = report.failure.as_ref().map(|failure| {
            json!({
                "kind": format!("{:?}", failure.kind),
                "error": failure.message,
                "notification": failure.notification.as_ref().map(|n| n.message.clone()),
            })
        });
        println!(
            "{}",
            json!({
                "flow": report.flow.to_string(),
                "phase": format!("{:?}", report.phase),
                "signatures": signatures,
                "failure": failure,
            })
        );
        return;
    }

    match &report.failure {
        None => {
            println!("{} successfully", flow_label(report.flow));
            for signature in &signatures {
                println!("  {}", signature);
            }
        }
        Some(failure) => match &failure.notification {
            Some(notification) => println!("{}", notification.message),
            None => println!("{} failed: {}", report.flow, failure.message),
        },
    }
}
