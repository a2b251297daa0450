use std::fmt::Write;
use std::io;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::Serialize;

use crate::models::{Aggregation, ItemStatEntry, RankingEntry};

const NO_DONATIONS: &str = "Nenhuma doação processada ainda.";
const BAR_COLUMNS: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum View {
    Ranking,
    Stats,
}

/// Groups thousands with `.` the way pt-BR prints integers.
pub fn format_points(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        grouped.push('-');
    }
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    grouped
}

pub fn rank_badge(index: usize) -> String {
    format!("{}º", index + 1)
}

fn badge_class(index: usize) -> &'static str {
    match index {
        0 => "gold",
        1 => "silver",
        2 => "bronze",
        _ => "default",
    }
}

pub fn bar_width_percent(quantity: i64, max_quantity: i64) -> f64 {
    quantity as f64 / max_quantity.max(1) as f64 * 100.0
}

fn item_tags(entry: &RankingEntry) -> String {
    entry
        .items
        .iter()
        .map(|item| format!("{}: {}", item.item_name, item.quantity))
        .collect::<Vec<_>>()
        .join("; ")
}

pub fn render_text(aggregation: &Aggregation, view: View, limit: Option<usize>) -> String {
    let mut output = String::new();
    let limit = limit.unwrap_or(usize::MAX);

    match view {
        View::Ranking => {
            let _ = writeln!(output, "Ranking de Doadores");
            if aggregation.ranking.is_empty() {
                let _ = writeln!(output, "{NO_DONATIONS}");
            }
            for (index, entry) in aggregation.ranking.iter().enumerate().take(limit) {
                let _ = writeln!(
                    output,
                    "{:>4} {} - {} pts [{}]",
                    rank_badge(index),
                    entry.donor_name,
                    format_points(entry.total_points),
                    item_tags(entry)
                );
            }
        }
        View::Stats => {
            let _ = writeln!(output, "Estatísticas de Itens Arrecadados");
            let stats = &aggregation.item_stats[..limit.min(aggregation.item_stats.len())];

            let _ = writeln!(output);
            let _ = writeln!(output, "Tabela de Referência: Pontos por Item");
            for stat in stats {
                let _ = writeln!(output, "- {}: {} pts", stat.item_name, stat.points_per_unit);
            }

            let _ = writeln!(output);
            let _ = writeln!(output, "Total de Itens Arrecadados e Pontos Gerados");
            for stat in stats {
                let _ = writeln!(
                    output,
                    "- {}: {} un, {} pts",
                    stat.item_name,
                    stat.total_quantity,
                    format_points(stat.total_points)
                );
            }

            let _ = writeln!(output);
            let _ = writeln!(output, "Itens Mais Arrecadados");
            let max_quantity = aggregation.max_quantity();
            for stat in stats {
                let width = bar_width_percent(stat.total_quantity, max_quantity);
                let columns = (width / 100.0 * BAR_COLUMNS as f64).round() as usize;
                let _ = writeln!(
                    output,
                    "{:<BAR_COLUMNS$} {} ({} un)",
                    "#".repeat(columns),
                    stat.item_name,
                    stat.total_quantity
                );
            }
        }
    }

    output
}

pub fn render_rejections(aggregation: &Aggregation) -> String {
    let mut output = String::new();
    for rejection in &aggregation.rejected {
        let _ = writeln!(
            output,
            "line {}: {} ({})",
            rejection.line_number, rejection.reason, rejection.line
        );
    }
    output
}

pub fn render_json(aggregation: &Aggregation) -> serde_json::Result<String> {
    serde_json::to_string_pretty(aggregation)
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn html_ranking(output: &mut String, ranking: &[RankingEntry], colors: &dyn Fn(&str) -> String) {
    let _ = writeln!(output, "<h2 class=\"section-title\">Ranking de Doadores</h2>");
    let _ = writeln!(output, "<table>");
    let _ = writeln!(
        output,
        "<thead><tr><th>#</th><th>Doador</th><th>Pontos Acumulados</th><th>Itens Doados (Qtd.)</th></tr></thead>"
    );
    let _ = writeln!(output, "<tbody>");
    for (index, entry) in ranking.iter().enumerate() {
        let _ = write!(
            output,
            "<tr><td class=\"rank-cell\"><span class=\"rank-badge {}\">{}</span></td><td>{}</td><td data-label=\"Pontos\">{}</td><td data-label=\"Itens\" class=\"item-tags-cell\">",
            badge_class(index),
            rank_badge(index),
            escape_html(&entry.donor_name),
            format_points(entry.total_points)
        );
        for item in &entry.items {
            let _ = write!(
                output,
                "<span class=\"item-tag\" style=\"background-color: {}\">{}: {}</span>",
                escape_html(&colors(&item.item_name)),
                escape_html(&item.item_name),
                item.quantity
            );
        }
        let _ = writeln!(output, "</td></tr>");
    }
    let _ = writeln!(output, "</tbody>");
    let _ = writeln!(output, "</table>");
    if ranking.is_empty() {
        let _ = writeln!(output, "<p class=\"no-data\">{NO_DONATIONS}</p>");
    }
}

fn html_stats(output: &mut String, stats: &[ItemStatEntry], max_quantity: i64) {
    let _ = writeln!(
        output,
        "<h2 class=\"section-title\">Estatísticas de Itens Arrecadados</h2>"
    );

    let _ = writeln!(
        output,
        "<h3 class=\"subtitle\">Tabela de Referência: Pontos por Item</h3>"
    );
    let _ = writeln!(output, "<table>");
    let _ = writeln!(
        output,
        "<thead><tr><th>Item</th><th>Pontos por Unidade</th></tr></thead>"
    );
    let _ = writeln!(output, "<tbody>");
    for stat in stats {
        let _ = writeln!(
            output,
            "<tr><td>{}</td><td data-label=\"Pontos\">{} pts</td></tr>",
            escape_html(&stat.item_name),
            stat.points_per_unit
        );
    }
    let _ = writeln!(output, "</tbody>");
    let _ = writeln!(output, "</table>");

    let _ = writeln!(
        output,
        "<h3 class=\"subtitle\">Total de Itens Arrecadados e Pontos Gerados</h3>"
    );
    let _ = writeln!(output, "<table>");
    let _ = writeln!(
        output,
        "<thead><tr><th>Item</th><th>Total Arrecadado</th><th>Pontos Totais Gerados</th></tr></thead>"
    );
    let _ = writeln!(output, "<tbody>");
    for stat in stats {
        let _ = writeln!(
            output,
            "<tr><td>{}</td><td data-label=\"Arrecadado\">{} un</td><td data-label=\"Pontos Totais\">{}</td></tr>",
            escape_html(&stat.item_name),
            stat.total_quantity,
            format_points(stat.total_points)
        );
    }
    let _ = writeln!(output, "</tbody>");
    let _ = writeln!(output, "</table>");

    let _ = writeln!(
        output,
        "<h3 class=\"subtitle\">Itens Mais Arrecadados (Gráfico)</h3>"
    );
    let _ = writeln!(output, "<div class=\"bar-chart-container\">");
    for stat in stats {
        let _ = writeln!(
            output,
            "<div class=\"bar-item\"><div class=\"bar-label\">{} ({} un)</div><div class=\"bar-wrapper\"><div class=\"bar\" style=\"width: {:.2}%; background: {}\"></div></div></div>",
            escape_html(&stat.item_name),
            stat.total_quantity,
            bar_width_percent(stat.total_quantity, max_quantity),
            escape_html(&stat.color)
        );
    }
    let _ = writeln!(output, "</div>");
}

const STYLE: &str = "body{font-family:sans-serif;margin:2rem;background:#f4f6f8}\
table{border-collapse:collapse;width:100%;margin-bottom:1.5rem;background:#fff}\
th,td{padding:.5rem .75rem;border-bottom:1px solid #e0e0e0;text-align:left}\
.tab-button{padding:.5rem 1rem;border:0;cursor:pointer;background:#e0e0e0}\
.tab-button.active{background:#36a2eb;color:#fff}\
.rank-badge{display:inline-block;padding:.2rem .5rem;border-radius:1rem;background:#ddd}\
.rank-badge.gold{background:#ffd700}.rank-badge.silver{background:#c0c0c0}\
.rank-badge.bronze{background:#cd7f32}\
.item-tag{display:inline-block;margin:.1rem;padding:.1rem .5rem;border-radius:.5rem;color:#fff}\
.bar-wrapper{background:#e0e0e0;height:1rem;border-radius:.5rem}\
.bar{height:100%;border-radius:.5rem}";

const SCRIPT: &str = "function showView(name){\
for(const v of document.querySelectorAll('.view')){v.hidden=v.id!==name;}\
for(const b of document.querySelectorAll('.tab-button')){b.classList.toggle('active',b.dataset.view===name);}}";

pub fn render_html(aggregation: &Aggregation, initial_view: View, generated_on: NaiveDate) -> String {
    let mut output = String::new();
    let (ranking_hidden, stats_hidden) = match initial_view {
        View::Ranking => ("", " hidden"),
        View::Stats => (" hidden", ""),
    };
    let (ranking_active, stats_active) = match initial_view {
        View::Ranking => (" active", ""),
        View::Stats => ("", " active"),
    };

    let _ = writeln!(output, "<!DOCTYPE html>");
    let _ = writeln!(output, "<html lang=\"pt-BR\">");
    let _ = writeln!(output, "<head>");
    let _ = writeln!(output, "<meta charset=\"utf-8\">");
    let _ = writeln!(output, "<title>Ranking das Doações</title>");
    let _ = writeln!(output, "<style>{STYLE}</style>");
    let _ = writeln!(output, "<script>{SCRIPT}</script>");
    let _ = writeln!(output, "</head>");
    let _ = writeln!(output, "<body>");
    let _ = writeln!(output, "<div class=\"app-container\">");
    let _ = writeln!(output, "<h1>Ranking das Doações</h1>");
    let _ = writeln!(output, "<div class=\"tabs-container\">");
    let _ = writeln!(
        output,
        "<button class=\"tab-button{ranking_active}\" data-view=\"ranking\" onclick=\"showView('ranking')\">🏆 Ranking de Doadores</button>"
    );
    let _ = writeln!(
        output,
        "<button class=\"tab-button{stats_active}\" data-view=\"stats\" onclick=\"showView('stats')\">📊 Estatísticas de Itens</button>"
    );
    let _ = writeln!(output, "</div>");

    let colors = |name: &str| {
        aggregation
            .item_stats
            .iter()
            .find(|stat| stat.item_name == name)
            .map_or_else(|| crate::catalog::DEFAULT_COLOR.to_string(), |stat| stat.color.clone())
    };

    let _ = writeln!(output, "<section class=\"view\" id=\"ranking\"{ranking_hidden}>");
    html_ranking(&mut output, &aggregation.ranking, &colors);
    let _ = writeln!(output, "</section>");

    let _ = writeln!(output, "<section class=\"view\" id=\"stats\"{stats_hidden}>");
    html_stats(&mut output, &aggregation.item_stats, aggregation.max_quantity());
    let _ = writeln!(output, "</section>");

    let _ = writeln!(output, "<footer>Gerado em {}</footer>", generated_on.format("%d/%m/%Y"));
    let _ = writeln!(output, "</div>");
    let _ = writeln!(output, "</body>");
    let _ = writeln!(output, "</html>");

    output
}

#[derive(Serialize)]
struct RankingRow<'a> {
    rank: usize,
    donor: &'a str,
    points: i64,
    items: String,
}

pub fn write_ranking_csv<W: io::Write>(writer: W, ranking: &[RankingEntry]) -> csv::Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for (index, entry) in ranking.iter().enumerate() {
        writer.serialize(RankingRow {
            rank: index + 1,
            donor: &entry.donor_name,
            points: entry.total_points,
            items: item_tags(entry),
        })?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_item_stats_csv<W: io::Write>(writer: W, stats: &[ItemStatEntry]) -> csv::Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for stat in stats {
        writer.serialize(stat)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DonatedItem, RejectReason, Rejection};

    fn sample() -> Aggregation {
        Aggregation {
            ranking: vec![
                RankingEntry {
                    donor_name: "Ana".to_string(),
                    total_points: 1250,
                    items: vec![
                        DonatedItem {
                            item_name: "Livro".to_string(),
                            quantity: 2,
                        },
                        DonatedItem {
                            item_name: "Mesa".to_string(),
                            quantity: 5,
                        },
                    ],
                },
                RankingEntry {
                    donor_name: "<Bob>".to_string(),
                    total_points: 20,
                    items: vec![DonatedItem {
                        item_name: "Livro".to_string(),
                        quantity: 1,
                    }],
                },
            ],
            item_stats: vec![
                ItemStatEntry {
                    item_name: "Mesa".to_string(),
                    points_per_unit: 242,
                    total_quantity: 5,
                    total_points: 1210,
                    color: "#9966ff".to_string(),
                },
                ItemStatEntry {
                    item_name: "Livro".to_string(),
                    points_per_unit: 20,
                    total_quantity: 3,
                    total_points: 60,
                    color: "#36a2eb".to_string(),
                },
                ItemStatEntry {
                    item_name: "Caderno".to_string(),
                    points_per_unit: 5,
                    total_quantity: 0,
                    total_points: 0,
                    color: "#ccc".to_string(),
                },
            ],
            rejected: vec![Rejection {
                line_number: 3,
                line: "Ana,Livro".to_string(),
                reason: RejectReason::MissingFields { found: 2 },
            }],
        }
    }

    #[test]
    fn formats_points_with_pt_br_grouping() {
        assert_eq!(format_points(0), "0");
        assert_eq!(format_points(999), "999");
        assert_eq!(format_points(1250), "1.250");
        assert_eq!(format_points(12_345_678), "12.345.678");
        assert_eq!(format_points(-4000), "-4.000");
    }

    #[test]
    fn badges_and_bar_widths() {
        assert_eq!(rank_badge(0), "1º");
        assert_eq!(rank_badge(3), "4º");
        assert_eq!(badge_class(2), "bronze");
        assert_eq!(badge_class(7), "default");
        assert_eq!(bar_width_percent(5, 5), 100.0);
        assert_eq!(bar_width_percent(0, 0), 0.0);
        assert!((bar_width_percent(3, 5) - 60.0).abs() < 1e-9);
    }

    #[test]
    fn text_ranking_lists_donors_in_order() {
        let text = render_text(&sample(), View::Ranking, None);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Ranking de Doadores");
        assert!(lines[1].contains("1º Ana - 1.250 pts [Livro: 2; Mesa: 5]"));
        assert!(lines[2].contains("2º <Bob> - 20 pts"));
    }

    #[test]
    fn text_limit_truncates_ranking() {
        let text = render_text(&sample(), View::Ranking, Some(1));
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn text_limit_applies_to_every_stats_section() {
        let text = render_text(&sample(), View::Stats, Some(1));
        assert!(text.contains("- Mesa: 242 pts"));
        assert!(text.contains("- Mesa: 5 un, 1.210 pts"));
        assert!(text.contains("Mesa (5 un)"));
        assert!(!text.contains("Livro"));
        assert!(!text.contains("Caderno"));
    }

    #[test]
    fn text_stats_draw_proportional_bars() {
        let text = render_text(&sample(), View::Stats, None);
        assert!(text.contains("- Mesa: 242 pts"));
        assert!(text.contains("- Mesa: 5 un, 1.210 pts"));
        let full = "#".repeat(BAR_COLUMNS);
        assert!(text.contains(&format!("{full} Mesa (5 un)")));
        assert!(text.contains(&format!("{:<BAR_COLUMNS$} Caderno (0 un)", "")));
    }

    #[test]
    fn empty_ranking_shows_placeholder() {
        let text = render_text(&Aggregation::default(), View::Ranking, None);
        assert!(text.contains(NO_DONATIONS));
        let html = render_html(
            &Aggregation::default(),
            View::Ranking,
            NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
        );
        assert!(html.contains(NO_DONATIONS));
    }

    #[test]
    fn html_escapes_names_and_selects_initial_view() {
        let date = NaiveDate::from_ymd_opt(2026, 2, 3).unwrap();
        let html = render_html(&sample(), View::Stats, date);
        assert!(html.contains("&lt;Bob&gt;"));
        assert!(!html.contains("<Bob>"));
        assert!(html.contains("<section class=\"view\" id=\"ranking\" hidden>"));
        assert!(html.contains("<section class=\"view\" id=\"stats\">"));
        assert!(html.contains("rank-badge gold\">1º"));
        assert!(html.contains("width: 100.00%; background: #9966ff"));
        assert!(html.contains("width: 60.00%; background: #36a2eb"));
        assert!(html.contains("Gerado em 03/02/2026"));
    }

    #[test]
    fn rejections_render_one_per_line() {
        let text = render_rejections(&sample());
        assert_eq!(text, "line 3: expected 3 fields, found 2 (Ana,Livro)\n");
    }

    #[test]
    fn json_contains_all_collections() {
        let json = render_json(&sample()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["ranking"][0]["total_points"], 1250);
        assert_eq!(value["item_stats"][2]["total_quantity"], 0);
        assert_eq!(value["rejected"][0]["reason"]["kind"], "missing_fields");
    }

    #[test]
    fn csv_exports_have_headers() {
        let mut buffer = Vec::new();
        write_ranking_csv(&mut buffer, &sample().ranking).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("rank,donor,points,items"));
        assert_eq!(lines.next(), Some("1,Ana,1250,Livro: 2; Mesa: 5"));

        let mut buffer = Vec::new();
        write_item_stats_csv(&mut buffer, &sample().item_stats).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.starts_with(
            "item_name,points_per_unit,total_quantity,total_points,color\n"
        ));
        assert!(text.contains("Caderno,5,0,0,#ccc"));
    }
}
