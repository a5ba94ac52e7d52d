//! Server-rendered HTML for the browser page.

use crate::scan::Package;

const INDEX_TEMPLATE: &str = include_str!("index.html");

const HEADERS: [&str; 6] = ["Sender", "Carrier", "Tracking #", "Description", "Arrives", "Status"];

/// The full page, with the OAuth client id filled in.
pub fn index_page(google_client_id: &str) -> String {
    INDEX_TEMPLATE
        .replace("{{GOOGLE_CLIENT_ID}}", &escape_html(google_client_id))
        .replace("{{IDLE_TABLE}}", &idle_table())
}

/// Results table for a completed scan.
pub fn render_package_table(packages: &[Package]) -> String {
    if packages.is_empty() {
        return placeholder_table("No deliveries found after the scan.");
    }

    let mut html = table_open();
    for pkg in packages {
        let tracking = match pkg.carrier.tracking_url(&pkg.tracking_number) {
            Some(url) => format!(
                "<a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">{}</a>",
                escape_html(&url),
                escape_html(&pkg.tracking_number)
            ),
            None => escape_html(&pkg.tracking_number),
        };
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            escape_html(&pkg.sender),
            escape_html(pkg.carrier.label()),
            tracking,
            escape_html(&pkg.description),
            pkg.date.format("%a, %b %-d"),
            escape_html(pkg.status.label()),
        ));
    }
    html.push_str("</tbody></table>");
    html
}

/// Placeholder shown before the first scan and after logout.
pub fn idle_table() -> String {
    placeholder_table("Ready to scan for your packages!")
}

fn placeholder_table(text: &str) -> String {
    let mut html = table_open();
    html.push_str(&format!(
        "<tr><td class=\"placeholder\" colspan=\"{}\">{}</td></tr>\n</tbody></table>",
        HEADERS.len(),
        escape_html(text)
    ));
    html
}

fn table_open() -> String {
    let mut html = String::from("<table class=\"packages\"><thead><tr>");
    for header in HEADERS {
        html.push_str(&format!("<th>{}</th>", escape_html(header)));
    }
    html.push_str("</tr></thead><tbody>\n");
    html
}

/// Escape text for HTML element content and quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::scan::{Carrier, PackageStatus};

    fn package(carrier: Carrier, tracking: &str) -> Package {
        Package {
            sender: "Acme & Sons".into(),
            carrier,
            description: "Your <b>order</b> has shipped".into(),
            tracking_number: tracking.into(),
            date: Utc.with_ymd_and_hms(2026, 10, 23, 0, 0, 0).unwrap(),
            status: PackageStatus::InTransit,
        }
    }

    #[test]
    fn table_has_all_columns() {
        let html = render_package_table(&[package(Carrier::Ups, "1Z999AA10123456784")]);
        for header in ["Sender", "Carrier", "Tracking #", "Description", "Arrives", "Status"] {
            assert!(html.contains(&format!("<th>{header}</th>")), "missing {header}");
        }
        assert!(html.contains("<td>Fri, Oct 23</td>"));
        assert!(html.contains("<td>In Transit</td>"));
        assert!(html.contains("<td>UPS</td>"));
    }

    #[test]
    fn tracking_links_to_carrier() {
        let html = render_package_table(&[package(Carrier::FedEx, "123456789012")]);
        assert!(html.contains(
            "<a href=\"https://www.fedex.com/fedextrack/?trknbr=123456789012\" target=\"_blank\""
        ));
    }

    #[test]
    fn unknown_carrier_has_no_link() {
        let html = render_package_table(&[package(Carrier::Unknown, "112-1234567-1234567")]);
        assert!(!html.contains("<a "));
        assert!(html.contains("<td>112-1234567-1234567</td>"));
    }

    #[test]
    fn text_is_escaped() {
        let html = render_package_table(&[package(Carrier::Usps, "9400111899223456789012")]);
        assert!(html.contains("Acme &amp; Sons"));
        assert!(html.contains("Your &lt;b&gt;order&lt;/b&gt; has shipped"));
        assert!(!html.contains("<b>"));
    }

    #[test]
    fn empty_and_idle_tables() {
        assert!(render_package_table(&[]).contains("No deliveries found after the scan."));
        let idle = idle_table();
        assert!(idle.contains("Ready to scan for your packages!"));
        assert!(idle.contains("colspan=\"6\""));
    }

    #[test]
    fn index_page_embeds_client_id() {
        let page = index_page("1234-abc.apps.googleusercontent.com");
        assert!(page.contains("data-client-id=\"1234-abc.apps.googleusercontent.com\""));
        assert!(page.contains("Ready to scan for your packages!"));
        assert!(page.contains("/api/scan/table"));
        assert!(!page.contains("{{"));
    }

    #[test]
    fn index_page_escapes_client_id() {
        let page = index_page("\"><script>alert(1)</script>");
        assert!(page.contains("data-client-id=\"&quot;&gt;&lt;script&gt;"));
        assert!(!page.contains("<script>alert(1)"));
    }
}
