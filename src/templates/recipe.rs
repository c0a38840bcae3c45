use super::escape;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RecipeData {
    #[validate(length(min = 1))]
    pub recipe_name: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub prep_time: Option<String>,
    #[serde(default)]
    pub cook_time: Option<String>,
    #[serde(default)]
    pub servings: Option<i32>,
    #[validate(length(min = 1))]
    pub ingredients: Vec<String>,
    #[validate(length(min = 1))]
    pub instructions: Vec<String>,

    // Premium-only inputs; stripped by the content gate for basic renders.
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub video_url: Option<String>,
}

impl RecipeData {
    pub fn strip_premium_fields(&mut self) {
        self.image_urls.clear();
        self.video_url = None;
    }
}

pub fn render(data: &RecipeData, premium: bool) -> String {
    if premium {
        render_premium(data)
    } else {
        render_basic(data)
    }
}

fn list(items: &[String]) -> String {
    items
        .iter()
        .map(|i| format!("<li>{}</li>", escape(i)))
        .collect()
}

fn render_basic(data: &RecipeData) -> String {
    format!(
        r#"<h1>Recipe: {name}</h1>
{author}
{prep}
{cook}
<h3>Ingredients:</h3>
<ul>{ingredients}</ul>
<h3>Instructions:</h3>
<ol>{instructions}</ol>"#,
        name = escape(&data.recipe_name),
        author = data
            .author
            .as_deref()
            .map(|a| format!("<p>Author: {}</p>", escape(a)))
            .unwrap_or_default(),
        prep = data
            .prep_time
            .as_deref()
            .map(|p| format!("<p>Prep Time: {}</p>", escape(p)))
            .unwrap_or_default(),
        cook = data
            .cook_time
            .as_deref()
            .map(|c| format!("<p>Cook Time: {}</p>", escape(c)))
            .unwrap_or_default(),
        ingredients = list(&data.ingredients),
        instructions = list(&data.instructions),
    )
}

fn render_premium(data: &RecipeData) -> String {
    let tags = [
        data.prep_time
            .as_deref()
            .map(|p| format!(r#"<span class="tag">Prep: {}</span>"#, escape(p))),
        data.cook_time
            .as_deref()
            .map(|c| format!(r#"<span class="tag">Cook: {}</span>"#, escape(c))),
        data.servings
            .map(|s| format!(r#"<span class="tag">Serves: {}</span>"#, s)),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(" ");

    let images = if data.image_urls.is_empty() {
        String::new()
    } else {
        let imgs = data
            .image_urls
            .iter()
            .map(|url| {
                format!(
                    r#"<img src="{}" style="max-width:220px;border-radius:8px;margin:4px;" />"#,
                    escape(url)
                )
            })
            .collect::<String>();
        format!(r#"<div class="section">{imgs}</div>"#)
    };

    let video = data
        .video_url
        .as_deref()
        .map(|url| {
            format!(
                r#"<div class="section"><p>Watch: <a href="{0}">{0}</a></p></div>"#,
                escape(url)
            )
        })
        .unwrap_or_default();

    format!(
        r#"<h1 style="color:#2a3d66;">{name}</h1>
{author}
<div class="section">{tags}</div>
{images}
<div class="section">
  <h2>Ingredients</h2>
  <ul>{ingredients}</ul>
</div>
<div class="section">
  <h2>Instructions</h2>
  <ol>{instructions}</ol>
</div>
{video}"#,
        name = escape(&data.recipe_name),
        author = data
            .author
            .as_deref()
            .map(|a| format!("<p><em>by {}</em></p>", escape(a)))
            .unwrap_or_default(),
        ingredients = list(&data.ingredients),
        instructions = list(&data.instructions),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RecipeData {
        RecipeData {
            recipe_name: "Shakshuka".to_string(),
            author: Some("N. Ottolenghi".to_string()),
            prep_time: Some("10 min".to_string()),
            cook_time: Some("25 min".to_string()),
            servings: Some(4),
            ingredients: vec!["Eggs".to_string(), "Tomatoes".to_string()],
            instructions: vec!["Simmer sauce".to_string(), "Poach eggs".to_string()],
            image_urls: vec!["https://example.com/shak.jpg".to_string()],
            video_url: Some("https://example.com/video".to_string()),
        }
    }

    #[test]
    fn basic_variant_skips_media() {
        let html = render(&sample(), false);
        assert!(html.contains("Shakshuka"));
        assert!(html.contains("Poach eggs"));
        assert!(!html.contains("shak.jpg"));
        assert!(!html.contains("example.com/video"));
    }

    #[test]
    fn premium_variant_renders_media_and_tags() {
        let html = render(&sample(), true);
        assert!(html.contains("shak.jpg"));
        assert!(html.contains("example.com/video"));
        assert!(html.contains("Serves: 4"));
    }
}
