use sampleweb_config::DisplayInfo;

/// Renders the landing page.
pub(crate) fn render_index(info: &DisplayInfo) -> String {
    let rows = [
        ("Host", info.host.as_str()),
        ("Site", info.site.as_str()),
        ("Sku", info.sku.as_str()),
        ("UserAssignedClientId", info.user_assigned_client_id.as_str()),
        (
            "AdminStorageAccountConfigurationFilePath",
            info.storage_config_path.as_str(),
        ),
        ("CosmosConnectionString", info.cosmos_endpoint.as_str()),
    ];

    let table = rows
        .iter()
        .map(|(name, value)| {
            format!(
                "      <tr><th>{name}</th><td id=\"{name}\">{}</td></tr>\n",
                escape(value)
            )
        })
        .collect::<String>();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <title>{site}</title>
  </head>
  <body>
    <h1>{site}</h1>
    <table>
{table}    </table>
    <p>
      <a href="/?handler=Storage">Storage</a>
      <a href="/?handler=Cosmos">Cosmos</a>
    </p>
  </body>
</html>
"#,
        site = escape(info.site.as_str()),
    )
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
