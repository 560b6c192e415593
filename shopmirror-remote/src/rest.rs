//! HTTP implementation of [`ShopClient`] over the admin REST API.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::api::{AssetUpload, ShopClient};
use crate::error::RemoteError;
use crate::paging::{fetch_all, PAGE_LIMIT};
use crate::types::{Article, Asset, Blog, Page, Redirect, ScriptTag, Theme};

const API_VERSION: &str = "2024-01";
const TOKEN_HEADER: &str = "X-Shopify-Access-Token";

/// Admin REST client for one store.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base: String,
    token: String,
}

impl RestClient {
    /// `shop` is the store domain, e.g. `example.myshopify.com`.
    pub fn new(shop: &str, token: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: format!("https://{shop}/admin/api/{API_VERSION}"),
            token: token.to_owned(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    async fn check(path: &str, resp: reqwest::Response) -> Result<reqwest::Response, RemoteError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(RemoteError::Status {
            status: status.as_u16(),
            path: path.to_owned(),
            body,
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, RemoteError> {
        debug!(path, "GET");
        let resp = self
            .http
            .get(self.url(path))
            .header(TOKEN_HEADER, &self.token)
            .send()
            .await?;
        Ok(Self::check(path, resp).await?.json().await?)
    }

    /// GET where 404 means "does not exist" rather than failure.
    async fn get_optional<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, RemoteError> {
        debug!(path, "GET");
        let resp = self
            .http
            .get(self.url(path))
            .header(TOKEN_HEADER, &self.token)
            .send()
            .await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(Self::check(path, resp).await?.json().await?))
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, RemoteError> {
        debug!(path, "POST");
        let resp = self
            .http
            .post(self.url(path))
            .header(TOKEN_HEADER, &self.token)
            .json(body)
            .send()
            .await?;
        Ok(Self::check(path, resp).await?.json().await?)
    }

    async fn put<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, RemoteError> {
        debug!(path, "PUT");
        let resp = self
            .http
            .put(self.url(path))
            .header(TOKEN_HEADER, &self.token)
            .json(body)
            .send()
            .await?;
        Ok(Self::check(path, resp).await?.json().await?)
    }

    /// DELETE where 404 counts as already gone.
    async fn delete(&self, path: &str) -> Result<(), RemoteError> {
        debug!(path, "DELETE");
        let resp = self
            .http
            .delete(self.url(path))
            .header(TOKEN_HEADER, &self.token)
            .send()
            .await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        Self::check(path, resp).await?;
        Ok(())
    }

    async fn count(&self, path: &str) -> Result<u64, RemoteError> {
        Ok(self.get::<CountEnvelope>(path).await?.count)
    }
}

// ---- response envelopes ----

#[derive(Deserialize)]
struct CountEnvelope {
    count: u64,
}

#[derive(Deserialize)]
struct ThemesEnvelope {
    themes: Vec<Theme>,
}

#[derive(Deserialize)]
struct ThemeEnvelope {
    theme: Theme,
}

#[derive(Deserialize)]
struct AssetsEnvelope {
    assets: Vec<Asset>,
}

#[derive(Deserialize)]
struct AssetEnvelope {
    asset: Asset,
}

#[derive(Deserialize)]
struct RedirectsEnvelope {
    redirects: Vec<Redirect>,
}

#[derive(Deserialize)]
struct RedirectEnvelope {
    redirect: Redirect,
}

#[derive(Deserialize)]
struct ScriptTagsEnvelope {
    script_tags: Vec<ScriptTag>,
}

#[derive(Deserialize)]
struct ScriptTagEnvelope {
    script_tag: ScriptTag,
}

#[derive(Deserialize)]
struct PagesEnvelope {
    pages: Vec<Page>,
}

#[derive(Deserialize)]
struct PageEnvelope {
    page: Page,
}

#[derive(Deserialize)]
struct BlogsEnvelope {
    blogs: Vec<Blog>,
}

#[derive(Deserialize)]
struct ArticlesEnvelope {
    articles: Vec<Article>,
}

#[derive(Deserialize)]
struct ArticleEnvelope {
    article: Article,
}

#[async_trait]
impl ShopClient for RestClient {
    async fn list_themes(&self) -> Result<Vec<Theme>, RemoteError> {
        Ok(self.get::<ThemesEnvelope>("/themes.json").await?.themes)
    }

    async fn create_theme(&self, name: &str, src: Option<&str>) -> Result<Theme, RemoteError> {
        let mut theme = json!({ "name": name });
        if let Some(src) = src {
            theme["src"] = json!(src);
        }
        let env: ThemeEnvelope = self.post("/themes.json", &json!({ "theme": theme })).await?;
        Ok(env.theme)
    }

    async fn publish_theme(&self, theme_id: u64) -> Result<Theme, RemoteError> {
        let body = json!({ "theme": { "id": theme_id, "role": "main" } });
        let env: ThemeEnvelope = self.put(&format!("/themes/{theme_id}.json"), &body).await?;
        Ok(env.theme)
    }

    async fn list_assets(&self, theme_id: u64) -> Result<Vec<Asset>, RemoteError> {
        let env: AssetsEnvelope = self
            .get(&format!("/themes/{theme_id}/assets.json"))
            .await?;
        Ok(env.assets)
    }

    async fn get_asset(&self, theme_id: u64, key: &str) -> Result<Option<Asset>, RemoteError> {
        let env: Option<AssetEnvelope> = self
            .get_optional(&format!("/themes/{theme_id}/assets.json?asset[key]={key}"))
            .await?;
        Ok(env.map(|env| env.asset))
    }

    async fn put_asset(&self, theme_id: u64, upload: &AssetUpload) -> Result<(), RemoteError> {
        let _: Value = self
            .put(
                &format!("/themes/{theme_id}/assets.json"),
                &json!({ "asset": upload }),
            )
            .await?;
        Ok(())
    }

    async fn delete_asset(&self, theme_id: u64, key: &str) -> Result<(), RemoteError> {
        self.delete(&format!("/themes/{theme_id}/assets.json?asset[key]={key}"))
            .await
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, RemoteError> {
        debug!(url, "GET");
        let resp = self.http.get(url).send().await?;
        let resp = Self::check(url, resp).await?;
        Ok(resp.bytes().await?.to_vec())
    }

    async fn list_redirects(&self) -> Result<Vec<Redirect>, RemoteError> {
        fetch_all(
            |since| async move {
                let env: RedirectsEnvelope = self
                    .get(&format!("/redirects.json?limit={PAGE_LIMIT}&since_id={since}"))
                    .await?;
                Ok(env.redirects)
            },
            || async move { self.count("/redirects/count.json").await },
        )
        .await
    }

    async fn create_redirect(&self, path: &str, target: &str) -> Result<Redirect, RemoteError> {
        let body = json!({ "redirect": { "path": path, "target": target } });
        let env: RedirectEnvelope = self.post("/redirects.json", &body).await?;
        Ok(env.redirect)
    }

    async fn update_redirect(
        &self,
        redirect_id: u64,
        path: &str,
        target: &str,
    ) -> Result<Redirect, RemoteError> {
        let body = json!({ "redirect": { "id": redirect_id, "path": path, "target": target } });
        let env: RedirectEnvelope = self
            .put(&format!("/redirects/{redirect_id}.json"), &body)
            .await?;
        Ok(env.redirect)
    }

    async fn delete_redirect(&self, redirect_id: u64) -> Result<(), RemoteError> {
        self.delete(&format!("/redirects/{redirect_id}.json")).await
    }

    async fn list_script_tags(&self) -> Result<Vec<ScriptTag>, RemoteError> {
        fetch_all(
            |since| async move {
                let env: ScriptTagsEnvelope = self
                    .get(&format!(
                        "/script_tags.json?limit={PAGE_LIMIT}&since_id={since}"
                    ))
                    .await?;
                Ok(env.script_tags)
            },
            || async move { self.count("/script_tags/count.json").await },
        )
        .await
    }

    async fn create_script_tag(
        &self,
        src: &str,
        event: &str,
        display_scope: Option<&str>,
    ) -> Result<ScriptTag, RemoteError> {
        let mut tag = json!({ "src": src, "event": event });
        if let Some(scope) = display_scope {
            tag["display_scope"] = json!(scope);
        }
        let env: ScriptTagEnvelope = self
            .post("/script_tags.json", &json!({ "script_tag": tag }))
            .await?;
        Ok(env.script_tag)
    }

    async fn update_script_tag(
        &self,
        script_tag_id: u64,
        src: &str,
        event: &str,
        display_scope: Option<&str>,
    ) -> Result<ScriptTag, RemoteError> {
        let mut tag = json!({ "id": script_tag_id, "src": src, "event": event });
        if let Some(scope) = display_scope {
            tag["display_scope"] = json!(scope);
        }
        let env: ScriptTagEnvelope = self
            .put(
                &format!("/script_tags/{script_tag_id}.json"),
                &json!({ "script_tag": tag }),
            )
            .await?;
        Ok(env.script_tag)
    }

    async fn delete_script_tag(&self, script_tag_id: u64) -> Result<(), RemoteError> {
        self.delete(&format!("/script_tags/{script_tag_id}.json"))
            .await
    }

    async fn list_pages(&self) -> Result<Vec<Page>, RemoteError> {
        fetch_all(
            |since| async move {
                let env: PagesEnvelope = self
                    .get(&format!("/pages.json?limit={PAGE_LIMIT}&since_id={since}"))
                    .await?;
                Ok(env.pages)
            },
            || async move { self.count("/pages/count.json").await },
        )
        .await
    }

    async fn create_page(&self, page: &Value) -> Result<Page, RemoteError> {
        let env: PageEnvelope = self.post("/pages.json", &json!({ "page": page })).await?;
        Ok(env.page)
    }

    async fn update_page(&self, page_id: u64, page: &Value) -> Result<Page, RemoteError> {
        let env: PageEnvelope = self
            .put(&format!("/pages/{page_id}.json"), &json!({ "page": page }))
            .await?;
        Ok(env.page)
    }

    async fn delete_page(&self, page_id: u64) -> Result<(), RemoteError> {
        self.delete(&format!("/pages/{page_id}.json")).await
    }

    async fn list_blogs(&self) -> Result<Vec<Blog>, RemoteError> {
        fetch_all(
            |since| async move {
                let env: BlogsEnvelope = self
                    .get(&format!("/blogs.json?limit={PAGE_LIMIT}&since_id={since}"))
                    .await?;
                Ok(env.blogs)
            },
            || async move { self.count("/blogs/count.json").await },
        )
        .await
    }

    async fn list_articles(&self, blog_id: u64) -> Result<Vec<Article>, RemoteError> {
        fetch_all(
            |since| async move {
                let env: ArticlesEnvelope = self
                    .get(&format!(
                        "/blogs/{blog_id}/articles.json?limit={PAGE_LIMIT}&since_id={since}"
                    ))
                    .await?;
                Ok(env.articles)
            },
            || async move { self.count(&format!("/blogs/{blog_id}/articles/count.json")).await },
        )
        .await
    }

    async fn create_article(&self, blog_id: u64, article: &Value) -> Result<Article, RemoteError> {
        let env: ArticleEnvelope = self
            .post(
                &format!("/blogs/{blog_id}/articles.json"),
                &json!({ "article": article }),
            )
            .await?;
        Ok(env.article)
    }

    async fn update_article(
        &self,
        blog_id: u64,
        article_id: u64,
        article: &Value,
    ) -> Result<Article, RemoteError> {
        let env: ArticleEnvelope = self
            .put(
                &format!("/blogs/{blog_id}/articles/{article_id}.json"),
                &json!({ "article": article }),
            )
            .await?;
        Ok(env.article)
    }

    async fn delete_article(&self, blog_id: u64, article_id: u64) -> Result<(), RemoteError> {
        self.delete(&format!("/blogs/{blog_id}/articles/{article_id}.json"))
            .await
    }
}
