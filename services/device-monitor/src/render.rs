//! Server-side HTML rendering of a composed view

use crate::model::{Alert, DeviceConfig, DeviceData, LogEvent};
use crate::notifications::{NotificationRecord, PermissionState};
use crate::view::{DashboardView, Panel, StatusLeds};

const CELL: &str = r#"style="padding: 0.5rem;""#;
const HEAD: &str = r#"style="padding: 0.5rem; text-align: left;""#;
const ROW: &str = r#"style="border-bottom: 1px solid #dee2e6;""#;

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Full HTML page for the active tab
pub fn render_page(view: &DashboardView) -> String {
    let tabs: String = view
        .tabs
        .iter()
        .map(|t| {
            let style = if t.active {
                "font-weight: 700; border-bottom: 3px solid #0d6efd;"
            } else {
                "color: #6c757d;"
            };
            format!(
                r#"<a href="/?tab={}" style="padding: 0.5rem 1rem; text-decoration: none; {}">{}</a>"#,
                t.tab.slug(),
                style,
                escape_html(&t.label)
            )
        })
        .collect();

    let panels: String = view.panels.iter().map(render_panel).collect();

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Device Monitor</title>
    <script>
        function send(method, url, body) {{
            const init = {{ method: method, headers: {{ 'Content-Type': 'application/json' }} }};
            if (body !== undefined) {{ init.body = body; }}
            return fetch(url, init).then(r => {{
                if (!r.ok) {{ return r.json().then(e => alert(e.error)); }}
                location.reload();
            }});
        }}
        function saveConfig() {{
            send('POST', '/api/config', document.getElementById('config-editor').value);
        }}
        function switchDevice() {{
            const id = document.getElementById('device-input').value;
            send('PUT', '/api/device', JSON.stringify({{ device_id: id }}));
        }}
        setInterval(() => location.reload(), 10000);
    </script>
</head>
<body style="font-family: system-ui, sans-serif; max-width: 960px; margin: 0 auto; padding: 1rem;">
    <h1>Device Monitor</h1>
    <p>
        House <strong>{device}</strong> {connection}
        <input id="device-input" value="{device}" size="8">
        <button onclick="switchDevice()">Switch</button>
    </p>
    <nav style="border-bottom: 1px solid #dee2e6; margin-bottom: 1rem;">{tabs}</nav>
    {panels}
</body>
</html>"#,
        device = escape_html(&view.device_id),
        connection = badge(view.connected, "Connected", "Disconnected"),
        tabs = tabs,
        panels = panels,
    )
}

fn render_panel(panel: &Panel) -> String {
    match panel {
        Panel::Dashboard { connected, data } => render_dashboard(*connected, data.as_ref()),
        Panel::StatusLeds(leds) => render_leds(leds),
        Panel::Alerts { alerts } => render_alerts(alerts),
        Panel::NotificationSetup { permission } => render_permission(*permission),
        Panel::NotificationHistory { unread, records } => render_history(*unread, records),
        Panel::LocationTracker { location, map_url } => match (location, map_url) {
            (Some(location), Some(url)) => section(
                "Location",
                &format!(
                    r#"<p>Latitude {:.5}, longitude {:.5}</p><p><a href="{}" target="_blank">Open map</a></p>"#,
                    location.lat,
                    location.lng,
                    escape_html(url)
                ),
            ),
            _ => section("Location", "<p>No position reported yet.</p>"),
        },
        Panel::ConfigPanel { config } => render_config(config.as_ref()),
        Panel::CalibrationPanel { device_id } => section(
            "Calibration",
            &format!(
                r#"<p>Send a calibration command to house {}.</p>
<button onclick="send('POST', '/api/calibrate')">Start calibration</button>"#,
                escape_html(device_id)
            ),
        ),
        Panel::EventLogs { events } => render_logs(events),
    }
}

fn section(title: &str, body: &str) -> String {
    format!("<section>\n<h2>{}</h2>\n{}\n</section>\n", title, body)
}

fn badge(on: bool, on_text: &str, off_text: &str) -> String {
    let (text, color, bg) = if on {
        (on_text, "#155724", "#d4edda")
    } else {
        (off_text, "#721c24", "#f8d7da")
    };
    format!(
        r#"<span style="display: inline-block; padding: 0.25em 0.6em; border-radius: 0.25rem; font-size: 0.85em; font-weight: 600; color: {}; background-color: {};">{}</span>"#,
        color, bg, text
    )
}

fn table(headers: &[&str], rows: String) -> String {
    let head: String = headers
        .iter()
        .map(|h| format!("<th {}>{}</th>", HEAD, h))
        .collect();
    format!(
        r#"<table style="width: 100%; border-collapse: collapse;">
<thead><tr style="border-bottom: 2px solid #dee2e6;">{}</tr></thead>
<tbody>{}</tbody>
</table>"#,
        head, rows
    )
}

fn render_dashboard(connected: bool, data: Option<&DeviceData>) -> String {
    let Some(data) = data else {
        return section("Dashboard", &format!("<p>{}</p>", badge(connected, "Waiting for data", "Disconnected")));
    };
    let rows = [
        ("Temperature", format!("{:.1} °C", data.temperature)),
        ("Humidity", format!("{:.1} %", data.humidity)),
        ("LPG level", data.lpg_level.to_string()),
        ("Last reading", escape_html(&data.timestamp)),
    ]
    .iter()
    .map(|(name, value)| format!("<tr {}><td {}>{}</td><td {}>{}</td></tr>", ROW, CELL, name, CELL, value))
    .collect();
    section("Dashboard", &table(&["Reading", "Value"], rows))
}

fn render_leds(leds: &StatusLeds) -> String {
    let body = [
        badge(leds.connected, "Online", "Offline"),
        badge(!leds.flame, "No flame", "Flame detected"),
        badge(!leds.gas_leak, "No leak", "Gas leak"),
        badge(!leds.lpg_warning, "LPG normal", "LPG high"),
    ]
    .join(" ");
    section("Status", &format!("<p>{}</p>", body))
}

fn render_alerts(alerts: &[Alert]) -> String {
    if alerts.is_empty() {
        return section("Alerts", "<p>No alerts.</p>");
    }
    let rows = alerts
        .iter()
        .map(|a| {
            format!(
                "<tr {row}><td {c}>{}</td><td {c}>{}</td><td {c}>{}</td></tr>",
                escape_html(&a.kind),
                escape_html(&a.message),
                escape_html(&a.timestamp),
                row = ROW,
                c = CELL
            )
        })
        .collect();
    section("Alerts", &table(&["Type", "Message", "Time"], rows))
}

fn render_permission(permission: PermissionState) -> String {
    let body = match permission {
        PermissionState::Granted => "<p>Notifications are enabled.</p>".to_string(),
        PermissionState::Denied => "<p>Notifications are blocked.</p>".to_string(),
        PermissionState::Default => r#"<p>Notifications are not enabled yet.</p>
<button onclick="send('POST', '/api/notifications/permission')">Enable notifications</button>"#
            .to_string(),
    };
    section("Notification setup", &body)
}

fn render_history(unread: usize, records: &[NotificationRecord]) -> String {
    if records.is_empty() {
        return section("Notification history", "<p>No notifications received.</p>");
    }
    let rows = records
        .iter()
        .rev()
        .map(|r| {
            let action = if r.read {
                "Read".to_string()
            } else {
                format!(
                    r#"<button onclick="send('POST', '/api/notifications/{}/read')">Mark read</button>"#,
                    escape_html(&r.id)
                )
            };
            format!(
                "<tr {row}><td {c}>{}</td><td {c}>{}</td><td {c}>{}</td><td {c}>{}</td></tr>",
                escape_html(&r.title),
                escape_html(&r.body),
                escape_html(&r.received_at),
                action,
                row = ROW,
                c = CELL
            )
        })
        .collect();
    let body = format!(
        r#"<p>{} unread <button onclick="send('DELETE', '/api/notifications')">Clear</button></p>{}"#,
        unread,
        table(&["Title", "Message", "Received", ""], rows)
    );
    section("Notification history", &body)
}

fn render_config(config: Option<&DeviceConfig>) -> String {
    let current = match config {
        Some(config) => serde_json::to_string_pretty(&config.0).unwrap_or_default(),
        None => "{}".to_string(),
    };
    let status = if config.is_some() {
        ""
    } else {
        "<p>Not configured.</p>"
    };
    section(
        "Configuration",
        &format!(
            r#"{}<textarea id="config-editor" rows="10" style="width: 100%; font-family: monospace;">{}</textarea>
<button onclick="saveConfig()">Save</button>"#,
            status,
            escape_html(&current)
        ),
    )
}

fn render_logs(events: &[LogEvent]) -> String {
    if events.is_empty() {
        return section("Event log", "<p>No events.</p>");
    }
    let rows = events
        .iter()
        .map(|e| {
            format!(
                "<tr {row}><td {c}>{}</td><td {c}>{}</td><td {c}>{:.1}</td><td {c}>{:.1}</td><td {c}>{}</td><td {c}>{}</td><td {c}>{}</td></tr>",
                escape_html(&e.timestamp),
                escape_html(&e.event_type),
                e.temperature,
                e.humidity,
                e.lpg_level,
                yes_no(e.flame_status),
                yes_no(e.gas_leak_status),
                row = ROW,
                c = CELL
            )
        })
        .collect();
    section(
        "Event log",
        &table(
            &["Time", "Event", "Temp", "Humidity", "LPG", "Flame", "Leak"],
            rows,
        ),
    )
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}
