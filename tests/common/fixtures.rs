//! Search result pages in each retailer's markup

/// FairPrice results: `(name, price)` per card, `None` name for a card
/// whose name block is missing.
pub fn fairprice_page(cards: &[(Option<&str>, Option<&str>)]) -> String {
    let body: String = cards
        .iter()
        .map(|(name, price)| {
            let name = name
                .map(|n| {
                    format!(
                        r#"<div data-testid="product-name-and-metadata"><span>FairPrice</span><span>{n}</span></div>"#
                    )
                })
                .unwrap_or_default();
            let price = price
                .map(|p| format!("<div><span>{p}</span></div>"))
                .unwrap_or_default();
            format!(r#"<div data-testid="product"><span>Add</span>{name}{price}</div>"#)
        })
        .collect();
    format!("<html><body><main>{body}</main></body></html>")
}

/// Cold Storage results: price split into dollars and cents spans.
pub fn cold_storage_page(cards: &[(&str, &str, &str)]) -> String {
    let body: String = cards
        .iter()
        .map(|(name, dollars, cents)| {
            format!(
                r#"<a class="ware-wrapper" href="/p"><div class="name">{name}</div><div><span class="price">{dollars}</span><span class="small-price">{cents}</span></div></a>"#
            )
        })
        .collect();
    format!("<html><body>{body}</body></html>")
}

/// Sheng Siong results: `None` name for a card missing its name element.
pub fn sheng_siong_page(cards: &[(Option<&str>, &str)]) -> String {
    let body: String = cards
        .iter()
        .map(|(name, price)| {
            let name = name
                .map(|n| format!(r#"<div class="product-name">{n}</div>"#))
                .unwrap_or_default();
            format!(
                r#"<a class="product-preview" href="/p">{name}<div class="product-price"><span>{price}</span></div></a>"#
            )
        })
        .collect();
    format!("<html><body>{body}</body></html>")
}
