//! Server-rendered dashboard of aggregate ticket counters.

use axum::extract::State;
use axum::response::Html;
use v_htmlescape::escape;

use crate::AppState;
use crate::error::Result;
use crate::ticket::{Metrics, percentage};

/// Handler for `GET /`.
pub async fn handler(State(state): State<AppState>) -> Result<Html<String>> {
    let metrics = state.tickets.metrics().await?;
    Ok(Html(render_dashboard(
        &state.config.name,
        &metrics,
        state.config.refresh_interval,
    )))
}

fn render_card(id: &str, label: &str, value: &str) -> String {
    format!(
        r#"<div class="card"><span class="label">{}</span><strong id="{id}">{}</strong></div>"#,
        escape(label),
        escape(value),
    )
}

fn render_bar(id: &str, label: &str, count: usize, total: usize) -> String {
    let width = percentage(count, total);
    format!(
        r#"<div class="bar"><span class="label">{}</span><div class="track"><div class="fill" id="{id}-bar" style="width: {width}%"></div></div><span id="{id}">{count}</span></div>"#,
        escape(label),
    )
}

/// Render the dashboard page. The page refreshes its counters from
/// `/metrics.json` every `refresh_secs` seconds.
pub fn render_dashboard(name: &str, metrics: &Metrics, refresh_secs: u64) -> String {
    let cards = [
        render_card("total", "Total de atendimentos", &metrics.total.to_string()),
        render_card("resolved", "Resolvidos", &metrics.resolved.to_string()),
        render_card("unresolved", "Não resolvidos", &metrics.unresolved.to_string()),
        render_card(
            "completionRate",
            "Taxa de conclusão",
            &format!("{:.1}%", metrics.completion_rate),
        ),
        render_card(
            "inImplementation",
            "Em implementação",
            &metrics.in_implementation.to_string(),
        ),
    ]
    .join("\n");

    let bars = [
        render_bar("intercom", "INTERCOM", metrics.intercom, metrics.total),
        render_bar("gronerzap", "GRONERZAP", metrics.gronerzap, metrics.total),
    ]
    .join("\n");

    let departments = metrics
        .by_department
        .iter()
        .enumerate()
        .map(|(index, c)| {
            render_bar(&format!("department-{index}"), c.department.as_str(), c.count, metrics.total)
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r##"<!DOCTYPE html>
<html lang="pt-BR">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{name}</title>
    <style>
        body {{
            margin: 0;
            font-family: system-ui, -apple-system, 'Segoe UI', sans-serif;
            background: #f8fafc;
            color: #0f172a;
        }}
        main {{
            width: min(960px, 94vw);
            margin: 2.5rem auto;
        }}
        .cards {{
            display: grid;
            grid-template-columns: repeat(auto-fit, minmax(160px, 1fr));
            gap: 1rem;
        }}
        .card {{
            background: #fff;
            border: 1px solid #e2e8f0;
            border-radius: 12px;
            padding: 1.25rem;
            display: flex;
            flex-direction: column;
            gap: 0.5rem;
        }}
        .card strong {{
            font-size: 1.8rem;
        }}
        .label {{
            color: #64748b;
            font-size: 0.9rem;
        }}
        .bar {{
            display: grid;
            grid-template-columns: 120px 1fr 48px;
            align-items: center;
            gap: 1rem;
            margin-top: 1rem;
        }}
        .track {{
            background: #e2e8f0;
            border-radius: 999px;
            height: 12px;
        }}
        .fill {{
            background: #2563eb;
            border-radius: 999px;
            height: 100%;
            transition: width 0.4s ease;
        }}
    </style>
</head>
<body>
<main>
    <header><h1>{name}</h1></header>
    <section class="cards">
{cards}
    </section>
    <section>
        <h2>Plataformas</h2>
{bars}
    </section>
    <section>
        <h2>Departamentos</h2>
{departments}
    </section>
</main>
<script>
    const REFRESH_MS = {refresh_ms};

    async function refresh() {{
        try {{
            const response = await fetch("/metrics.json");
            if (!response.ok) return;
            const m = await response.json();
            for (const key of ["total", "resolved", "unresolved", "inImplementation"]) {{
                document.getElementById(key).textContent = m[key];
            }}
            document.getElementById("completionRate").textContent = m.completionRate.toFixed(1) + "%";
            for (const key of ["intercom", "gronerzap"]) {{
                const width = m.total > 0 ? Math.round(m[key] / m.total * 1000) / 10 : 0;
                document.getElementById(key).textContent = m[key];
                document.getElementById(key + "-bar").style.width = width + "%";
            }}
            m.byDepartment.forEach((d, index) => {{
                const key = "department-" + index;
                const width = m.total > 0 ? Math.round(d.count / m.total * 1000) / 10 : 0;
                document.getElementById(key).textContent = d.count;
                document.getElementById(key + "-bar").style.width = width + "%";
            }});
        }} catch (_) {{}}
    }}

    setInterval(refresh, REFRESH_MS);
</script>
</body>
</html>"##,
        name = escape(name),
        refresh_ms = refresh_secs.max(1).saturating_mul(1000),
    )
}
