//! HTML标签提取器
//! 基于 html5ever 流式分词，一次遍历提取 script-src、meta 与 a-href

use std::cell::RefCell;

use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};
use markup5ever::interface::Attribute;
use tendril::StrTendril;

#[derive(Debug, Default, Clone)]
pub struct HtmlExtractor {
    script_srcs: RefCell<Vec<String>>,
    meta_tags: RefCell<Vec<(String, String)>>,
    anchor_hrefs: RefCell<Vec<String>>,
}

impl TokenSink for HtmlExtractor {
    type Handle = ();

    fn process_token(&self, token: Token, _line: u64) -> TokenSinkResult<()> {
        if let Token::TagToken(Tag {
            kind: TagKind::StartTag,
            name,
            attrs,
            ..
        }) = token
        {
            match name.as_ref() {
                "script" => {
                    Self::push_attr(&self.script_srcs, &attrs, "src");
                    // 脚本内容按文本处理，其中的标签字符串不是真实元素
                    return TokenSinkResult::RawData(RawKind::ScriptData);
                }
                "a" => Self::push_attr(&self.anchor_hrefs, &attrs, "href"),
                "meta" => self.extract_meta_tag(&attrs),
                "style" | "xmp" | "iframe" | "noembed" | "noframes" => {
                    return TokenSinkResult::RawData(RawKind::Rawtext);
                }
                "textarea" | "title" => return TokenSinkResult::RawData(RawKind::Rcdata),
                _ => {}
            }
        }
        TokenSinkResult::Continue
    }
}

impl HtmlExtractor {
    /// 创建新的提取器
    pub fn new() -> Self {
        Self::default()
    }

    /// 从HTML字符串提取标签
    pub fn extract(&self, html: &str) -> Self {
        let tokenizer = Tokenizer::new(self.clone(), TokenizerOpts::default());
        let queue = BufferQueue::default();
        queue.push_back(StrTendril::from(html));

        let _ = tokenizer.feed(&queue);
        tokenizer.end();

        tokenizer.sink
    }

    /// 取出指定属性的非空值
    fn push_attr(target: &RefCell<Vec<String>>, attrs: &[Attribute], attr_name: &str) {
        if let Some(attr) = attrs.iter().find(|a| a.name.local.as_ref() == attr_name) {
            let value = attr.value.trim();
            if !value.is_empty() {
                target.borrow_mut().push(value.to_string());
            }
        }
    }

    /// 提取meta标签（name 缺省时取 property，名称统一小写）
    fn extract_meta_tag(&self, attrs: &[Attribute]) {
        let mut name = None;
        let mut property = None;
        let mut content = None;

        for attr in attrs {
            match attr.name.local.as_ref() {
                "name" => name = Some(attr.value.to_lowercase()),
                "property" => property = Some(attr.value.to_lowercase()),
                "content" => content = Some(attr.value.to_string()),
                _ => {}
            }
        }

        if let (Some(n), Some(c)) = (name.or(property), content) {
            self.meta_tags.borrow_mut().push((n, c));
        }
    }

    /// 获取提取到的script-src列表
    pub fn get_script_srcs(&self) -> Vec<String> {
        self.script_srcs.borrow().clone()
    }

    /// 获取提取到的meta标签列表
    pub fn get_meta_tags(&self) -> Vec<(String, String)> {
        self.meta_tags.borrow().clone()
    }

    /// 获取提取到的超链接列表
    pub fn get_anchor_hrefs(&self) -> Vec<String> {
        self.anchor_hrefs.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_extractor() {
        let html = r#"
            <script src="/jquery.min.js"></script>
            <meta name="Generator" content="WordPress 6.0" />
            <meta property="og:site_name" content="Example">
            <meta name="robots">
            <a href="/about">About</a>
            <a name="top"></a>
            <script>var inline = 1;</script>
            <script src="/vue.global.js"></script>
        "#;

        let result = HtmlExtractor::new().extract(html);

        assert_eq!(
            result.get_script_srcs(),
            vec!["/jquery.min.js".to_string(), "/vue.global.js".to_string()]
        );
        assert_eq!(
            result.get_meta_tags(),
            vec![
                ("generator".to_string(), "WordPress 6.0".to_string()),
                ("og:site_name".to_string(), "Example".to_string())
            ]
        );
        assert_eq!(result.get_anchor_hrefs(), vec!["/about".to_string()]);
    }

    #[test]
    fn test_extractor_survives_broken_markup() {
        let result = HtmlExtractor::new().extract("<a href='/x'><div <script src=\"a.js\"");
        assert_eq!(result.get_anchor_hrefs(), vec!["/x".to_string()]);
    }

    #[test]
    fn test_markup_inside_raw_text_elements_is_ignored() {
        let html = r#"
            <script>var t = '<a href="/ghost">'; document.write('<script src="/fake-jquery-1.0.js"></scr' + 'ipt>');</script>
            <style>a[href="/styled"] { color: red; }</style>
            <textarea><a href="/typed">x</a></textarea>
            <title><meta name="generator" content="Fake"></title>
            <a href="/real">Real</a>
            <script src="/app.js"></script>
        "#;

        let result = HtmlExtractor::new().extract(html);

        assert_eq!(result.get_anchor_hrefs(), vec!["/real".to_string()]);
        assert_eq!(result.get_script_srcs(), vec!["/app.js".to_string()]);
        assert!(result.get_meta_tags().is_empty());
    }
}
