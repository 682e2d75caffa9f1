//! Rendering of query results to stdout, as text or JSON.

use anyhow::Result;
use serde::Serialize;
use txgraph_core::{
    AccountBalance, AccountHistory, DegreeRankings, DegreeStats, Explorer, PathResult,
    RankingEntry, Summary, Transaction,
};

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_transfer(rank: usize, tx: &Transaction) {
    println!(
        "  {:>3}. tx {:<10} block {:<8} {} -> {}  {:.8}",
        rank, tx.tx_id, tx.block_id, tx.from, tx.to, tx.amount
    );
}

pub fn summary(summary: &Summary, json: bool) -> Result<()> {
    if json {
        return print_json(summary);
    }
    println!("Blocks:       {}", summary.blocks);
    println!("Transactions: {}", summary.transactions);
    println!("Users:        {}", summary.users);
    Ok(())
}

pub fn history(history: &AccountHistory, json: bool) -> Result<()> {
    if json {
        return print_json(history);
    }
    println!("\n=== HISTORY: {} ===", history.account);
    println!("Transactions: {}", history.total_count);
    println!("Received:     {:.8}", history.total_in);
    println!("Sent:         {:.8}", history.total_out);
    if !history.top_transfers.is_empty() {
        println!("\nLargest transfers:");
        for (i, tx) in history.top_transfers.iter().enumerate() {
            print_transfer(i + 1, tx);
        }
    }
    Ok(())
}

pub fn balance(balance: &AccountBalance, json: bool) -> Result<()> {
    if json {
        return print_json(balance);
    }
    println!("\n=== BALANCE: {} ===", balance.account);
    println!("Transactions: {}", balance.count);
    println!("Received:     {:.8}", balance.total_in);
    println!("Sent:         {:.8}", balance.total_out);
    println!("Balance:      {:.8}", balance.balance);
    Ok(())
}

fn print_ranking(title: &str, entries: &[RankingEntry]) {
    println!("\nTop {} by {}:", entries.len(), title);
    for (i, entry) in entries.iter().enumerate() {
        println!("  {:>3}. {:<40} {:.8}", i + 1, entry.account, entry.metric);
    }
}

pub fn ranking(title: &str, entries: &[RankingEntry], json: bool) -> Result<()> {
    if json {
        return print_json(entries);
    }
    print_ranking(title, entries);
    Ok(())
}

pub fn degrees(stats: &DegreeStats, rankings: &DegreeRankings, json: bool) -> Result<()> {
    if json {
        #[derive(Serialize)]
        struct Report<'a> {
            stats: &'a DegreeStats,
            rankings: &'a DegreeRankings,
        }
        return print_json(&Report { stats, rankings });
    }
    println!("\n=== DEGREES ===");
    println!("Average in-degree:           {:.4}", stats.avg_in);
    println!("Average out-degree:          {:.4}", stats.avg_out);
    println!("Average weighted in-degree:  {:.8}", stats.avg_weighted_in);
    println!("Average weighted out-degree: {:.8}", stats.avg_weighted_out);
    print_ranking("in-degree", &rankings.in_degree);
    print_ranking("out-degree", &rankings.out_degree);
    print_ranking("weighted in-degree", &rankings.weighted_in);
    print_ranking("weighted out-degree", &rankings.weighted_out);
    Ok(())
}

pub fn cycle(witness: Option<&[String]>, json: bool) -> Result<()> {
    if json {
        #[derive(Serialize)]
        struct Report<'a> {
            has_cycle: bool,
            cycle: Option<&'a [String]>,
        }
        return print_json(&Report {
            has_cycle: witness.is_some(),
            cycle: witness,
        });
    }
    match witness {
        Some(accounts) => {
            let mut walk = accounts.join(" -> ");
            if let Some(first) = accounts.first() {
                walk.push_str(" -> ");
                walk.push_str(first);
            }
            println!("Cycle found: {walk}");
        }
        None => println!("No cycle"),
    }
    Ok(())
}

pub fn path(
    explorer: &Explorer,
    from: &str,
    to: &str,
    path: Option<&PathResult>,
    json: bool,
) -> Result<()> {
    let steps: Vec<&Transaction> = path
        .map(|p| {
            p.transactions
                .iter()
                .filter_map(|tx_ref| explorer.transaction(*tx_ref))
                .collect()
        })
        .unwrap_or_default();

    if json {
        #[derive(Serialize)]
        struct Report<'a> {
            from: &'a str,
            to: &'a str,
            distance: Option<f64>,
            accounts: Option<&'a [String]>,
            steps: &'a [&'a Transaction],
        }
        return print_json(&Report {
            from,
            to,
            distance: path.map(|p| p.distance),
            accounts: path.map(|p| p.accounts.as_slice()),
            steps: &steps,
        });
    }

    let Some(path) = path else {
        println!("No path from {from} to {to}");
        return Ok(());
    };
    println!("\n=== SHORTEST PATH: {from} -> {to} ===");
    println!("Distance: {:.8}", path.distance);
    println!("Hops:     {}", path.hops());
    for (i, tx) in steps.iter().enumerate() {
        print_transfer(i + 1, tx);
    }
    Ok(())
}
