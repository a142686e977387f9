// src/services/extractor.rs

//! Document extractor.
//!
//! Turns a rendered post page into a [`PostDetail`]. The source markup is not
//! semantic and shifts between deployments, so every field is produced by an
//! ordered list of independent [`Strategy`] rules; the first rule that yields
//! a value wins. Extraction never fails: anything that goes wrong becomes an
//! [`ExtractionWarning`] next to whatever could still be extracted.

use std::collections::HashSet;

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::models::{ExtractionConfig, MenuItem, PostDetail};
use crate::services::parse_selector;
use crate::utils::{char_len, normalize_https, normalize_whitespace};

/// Soft problem met while extracting one post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionWarning {
    /// The detail page could not be rendered at all
    RenderFailed(String),
    /// A configured selector did not parse
    InvalidSelector(String),
    /// Neither an `article` nor a `main` container was present
    NoContainer,
    /// No title candidate passed the rules
    NoTitle,
    /// No body block passed the rules
    NoContent,
}

/// A value together with the soft warnings collected while producing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction<T> {
    pub value: T,
    pub warnings: Vec<ExtractionWarning>,
}

impl<T> Extraction<T> {
    pub fn has_warning(&self, warning: &ExtractionWarning) -> bool {
        self.warnings.contains(warning)
    }
}

impl Extraction<PostDetail> {
    /// Empty detail for a page that could not be rendered.
    pub fn render_failed(message: impl Into<String>) -> Self {
        Self {
            value: PostDetail::default(),
            warnings: vec![ExtractionWarning::RenderFailed(message.into())],
        }
    }
}

/// The parsed page plus the rules every strategy applies.
pub struct Scope<'a> {
    pub document: &'a Html,
    pub rules: &'a ExtractionConfig,
}

impl<'a> Scope<'a> {
    /// First element matching a tag-name container selector.
    pub fn container(&self, selector: &str) -> Option<ElementRef<'a>> {
        let sel = parse_selector(selector).ok()?;
        self.document.select(&sel).next()
    }

    /// Normalized text of every `strong` inside `root`, in document order.
    pub fn emphasized_texts(&self, root: ElementRef<'a>) -> Vec<String> {
        let Ok(sel) = parse_selector("strong") else {
            return Vec::new();
        };
        root.select(&sel)
            .map(|el| normalize_whitespace(&el.text().collect::<String>()))
            .collect()
    }

    /// Trimmed visible text nodes inside `root`, in document order.
    pub fn text_blocks(&self, root: ElementRef<'a>) -> Vec<String> {
        root.descendants()
            .filter(|node| !is_inside_invisible(node.parent().and_then(ElementRef::wrap)))
            .filter_map(|node| node.value().as_text().map(|t| t.trim().to_string()))
            .filter(|text| !text.is_empty())
            .collect()
    }

    fn is_title_candidate(&self, text: &str) -> bool {
        !text.is_empty()
            && !self.rules.is_excluded(text)
            && char_len(text) >= self.rules.title_min_len
    }

    fn is_content_candidate(&self, text: &str, title: &str) -> bool {
        char_len(text) >= self.rules.content_min_len
            && text != title
            && !self.rules.is_excluded(text)
    }
}

fn is_inside_invisible(parent: Option<ElementRef>) -> bool {
    parent
        .map(|el| matches!(el.value().name(), "script" | "style" | "noscript" | "template"))
        .unwrap_or(false)
}

/// Rule producing a title.
pub type TitleRule = fn(&Scope<'_>) -> Option<String>;

/// Rule producing body content, given the chosen title.
pub type ContentRule = fn(&Scope<'_>, &str) -> Option<String>;

/// A named candidate rule.
#[derive(Clone, Copy)]
pub struct Strategy<R> {
    pub name: &'static str,
    pub rule: R,
}

impl<R> Strategy<R> {
    pub const fn new(name: &'static str, rule: R) -> Self {
        Self { name, rule }
    }
}

fn first_match<R: Copy, T>(
    strategies: &[Strategy<R>],
    mut apply: impl FnMut(R) -> Option<T>,
) -> Option<(&'static str, T)> {
    strategies
        .iter()
        .find_map(|strategy| apply(strategy.rule).map(|value| (strategy.name, value)))
}

fn title_in(scope: &Scope<'_>, container: &str) -> Option<String> {
    let root = scope.container(container)?;
    scope
        .emphasized_texts(root)
        .into_iter()
        .find(|text| scope.is_title_candidate(text))
}

fn title_in_article(scope: &Scope<'_>) -> Option<String> {
    title_in(scope, "article")
}

fn title_in_main(scope: &Scope<'_>) -> Option<String> {
    title_in(scope, "main")
}

fn content_in(scope: &Scope<'_>, container: &str, title: &str) -> Option<String> {
    let root = scope.container(container)?;
    let blocks: Vec<String> = scope
        .text_blocks(root)
        .into_iter()
        .filter(|text| scope.is_content_candidate(text, title))
        .take(scope.rules.max_content_blocks)
        .collect();

    if blocks.is_empty() {
        None
    } else {
        Some(blocks.join("\n"))
    }
}

fn content_in_article(scope: &Scope<'_>, title: &str) -> Option<String> {
    content_in(scope, "article", title)
}

fn content_in_main(scope: &Scope<'_>, title: &str) -> Option<String> {
    content_in(scope, "main", title)
}

/// Default title rules, highest priority first.
pub const TITLE_STRATEGIES: [Strategy<TitleRule>; 2] = [
    Strategy::new("article-strong", title_in_article as TitleRule),
    Strategy::new("main-strong", title_in_main as TitleRule),
];

/// Default content rules, highest priority first.
pub const CONTENT_STRATEGIES: [Strategy<ContentRule>; 2] = [
    Strategy::new("article-text", content_in_article as ContentRule),
    Strategy::new("main-text", content_in_main as ContentRule),
];

/// Best-effort extractor for post detail pages.
pub struct DocumentExtractor {
    rules: ExtractionConfig,
    title_strategies: Vec<Strategy<TitleRule>>,
    content_strategies: Vec<Strategy<ContentRule>>,
}

impl DocumentExtractor {
    pub fn new(rules: ExtractionConfig) -> Self {
        Self {
            rules,
            title_strategies: TITLE_STRATEGIES.to_vec(),
            content_strategies: CONTENT_STRATEGIES.to_vec(),
        }
    }

    /// Replace the title rules.
    pub fn with_title_strategies(mut self, strategies: Vec<Strategy<TitleRule>>) -> Self {
        self.title_strategies = strategies;
        self
    }

    /// Replace the content rules.
    pub fn with_content_strategies(mut self, strategies: Vec<Strategy<ContentRule>>) -> Self {
        self.content_strategies = strategies;
        self
    }

    /// Extract a post's detail from its rendered HTML.
    ///
    /// `page_url` is used to resolve relative image sources.
    pub fn extract(&self, html: &str, page_url: &str) -> Extraction<PostDetail> {
        let document = Html::parse_document(html);
        let scope = Scope {
            document: &document,
            rules: &self.rules,
        };
        let base = Url::parse(page_url).ok();
        let mut warnings = Vec::new();

        if scope.container("article").is_none() && scope.container("main").is_none() {
            warnings.push(ExtractionWarning::NoContainer);
        }

        let title = match first_match(&self.title_strategies, |rule| rule(&scope)) {
            Some((name, title)) => {
                log::debug!("Title matched by '{}'", name);
                title
            }
            None => {
                warnings.push(ExtractionWarning::NoTitle);
                String::new()
            }
        };

        let content = match first_match(&self.content_strategies, |rule| rule(&scope, &title)) {
            Some((name, content)) => {
                log::debug!("Content matched by '{}'", name);
                content
            }
            None => {
                warnings.push(ExtractionWarning::NoContent);
                String::new()
            }
        };

        let image_sel = self.image_selector(&mut warnings);
        let image_urls = image_sel
            .as_ref()
            .map(|sel| collect_images(&document, sel, base.as_ref()))
            .unwrap_or_default();
        let menu_items = self.collect_menu_items(&document, image_sel.as_ref(), base.as_ref());

        Extraction {
            value: PostDetail {
                title,
                content,
                menu_items,
                image_urls,
            },
            warnings,
        }
    }

    fn image_selector(&self, warnings: &mut Vec<ExtractionWarning>) -> Option<Selector> {
        let marker = self.rules.image_alt_marker.replace('\\', "\\\\").replace('"', "\\\"");
        let selector = format!("img[alt=\"{marker}\"]");
        match parse_selector(&selector) {
            Ok(sel) => Some(sel),
            Err(e) => {
                warnings.push(ExtractionWarning::InvalidSelector(e.to_string()));
                None
            }
        }
    }

    /// Short paragraphs, unique by exact text, in document order.
    ///
    /// An item takes the content image of the nearest enclosing block when
    /// that block holds exactly one such image.
    fn collect_menu_items(
        &self,
        document: &Html,
        image_sel: Option<&Selector>,
        base: Option<&Url>,
    ) -> Vec<MenuItem> {
        let Ok(p_sel) = parse_selector("p") else {
            return Vec::new();
        };

        let mut seen = HashSet::new();
        let mut items = Vec::new();
        for p in document.select(&p_sel) {
            let name = normalize_whitespace(&p.text().collect::<String>());
            let len = char_len(&name);
            if len == 0 || len > self.rules.menu_max_len || self.rules.is_menu_excluded(&name) {
                continue;
            }
            if !seen.insert(name.clone()) {
                continue;
            }
            let image_url = image_sel.and_then(|sel| paired_image(p, sel, base));
            items.push(MenuItem { name, image_url });
        }
        items
    }
}

impl Default for DocumentExtractor {
    fn default() -> Self {
        Self::new(ExtractionConfig::default())
    }
}

const PAIRING_DEPTH: usize = 3;

fn paired_image(p: ElementRef, image_sel: &Selector, base: Option<&Url>) -> Option<String> {
    let mut current = p.parent().and_then(ElementRef::wrap);
    for _ in 0..PAIRING_DEPTH {
        let block = current?;
        let mut images = block.select(image_sel);
        if let Some(first) = images.next() {
            if images.next().is_some() {
                return None;
            }
            return image_src(first, base);
        }
        current = block.parent().and_then(ElementRef::wrap);
    }
    None
}

fn image_src(img: ElementRef, base: Option<&Url>) -> Option<String> {
    let src = img.value().attr("src")?.trim();
    if src.is_empty() {
        return None;
    }
    let absolute = match base.and_then(|b| b.join(src).ok()) {
        Some(url) => url.to_string(),
        None => src.to_string(),
    };
    Some(normalize_https(&absolute))
}

fn collect_images(document: &Html, image_sel: &Selector, base: Option<&Url>) -> Vec<String> {
    let mut seen = HashSet::new();
    document
        .select(image_sel)
        .filter_map(|img| image_src(img, base))
        .filter(|url| seen.insert(url.clone()))
        .collect()
}
