//! Poster resolution for rich-text players
//!
//! A token either names its poster or gets one generated from the first
//! decodable frame of its source. Generation is asynchronous and runs after
//! the clone is already in the document; when it finishes the clone may be
//! gone, in which case the result is dropped quietly.

use crate::error::Result;
use crate::pipeline::MountedClone;
use crate::token::Token;
use async_trait::async_trait;
use tracing::{debug, warn};

/// Encoding used for generated posters
pub const POSTER_MIME: &str = "image/jpeg";
/// Encoder quality for generated posters
pub const POSTER_QUALITY: f64 = 0.85;

/// Produces a still image URL (typically a data URL) for a media source
#[async_trait(?Send)]
pub trait PosterGenerator {
    async fn generate(&self, src: &str) -> Result<String>;
}

/// Where a clone's poster comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PosterPlan {
    Explicit(String),
    Generate,
}

impl PosterPlan {
    pub fn for_token(token: &Token) -> Self {
        match &token.poster {
            Some(poster) => PosterPlan::Explicit(poster.clone()),
            None => PosterPlan::Generate,
        }
    }
}

/// How an asynchronous poster resolution ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PosterOutcome {
    Applied,
    /// The clone left the document before the poster was ready
    Detached,
    /// Generation failed; the player stays without a poster
    Failed,
}

/// Generate a poster for `src` and apply it to `mount` if it is still attached
pub async fn resolve_poster<G, M>(generator: &G, mut mount: M, src: &str) -> PosterOutcome
where
    G: PosterGenerator + ?Sized,
    M: MountedClone,
{
    match generator.generate(src).await {
        Ok(poster) if mount.is_attached() => {
            mount.set_poster(&poster);
            debug!(src, "Generated poster applied");
            PosterOutcome::Applied
        }
        Ok(_) => {
            debug!(src, "Player detached before poster was ready");
            PosterOutcome::Detached
        }
        Err(e) => {
            warn!(src, error = %e, code = e.error_code(), "Poster generation failed");
            PosterOutcome::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::testing::FakeMount;

    struct StaticPoster(Option<&'static str>);

    #[async_trait(?Send)]
    impl PosterGenerator for StaticPoster {
        async fn generate(&self, _src: &str) -> Result<String> {
            self.0
                .map(str::to_string)
                .ok_or_else(|| Error::PosterGeneration("decode failed".into()))
        }
    }

    #[test]
    fn test_plan_from_token() {
        let mut token = Token::new("a.mp4");
        assert_eq!(PosterPlan::for_token(&token), PosterPlan::Generate);
        token.poster = Some("a.jpg".into());
        assert_eq!(PosterPlan::for_token(&token), PosterPlan::Explicit("a.jpg".into()));
    }

    #[test]
    fn test_applied_when_attached() {
        let mount = FakeMount::new();
        let outcome = tokio_test::block_on(resolve_poster(
            &StaticPoster(Some("data:image/jpeg;base64,AAAA")),
            mount.clone(),
            "a.mp4",
        ));
        assert_eq!(outcome, PosterOutcome::Applied);
        assert_eq!(mount.state().poster.as_deref(), Some("data:image/jpeg;base64,AAAA"));
    }

    #[test]
    fn test_detached_is_a_quiet_no_op() {
        let mount = FakeMount::new();
        mount.detach();
        let outcome = tokio_test::block_on(resolve_poster(
            &StaticPoster(Some("data:,")),
            mount.clone(),
            "a.mp4",
        ));
        assert_eq!(outcome, PosterOutcome::Detached);
        assert_eq!(mount.state().poster, None);
    }

    #[test]
    fn test_failure_leaves_no_poster() {
        let mount = FakeMount::new();
        let outcome = tokio_test::block_on(resolve_poster(&StaticPoster(None), mount.clone(), "a.mp4"));
        assert_eq!(outcome, PosterOutcome::Failed);
        assert_eq!(mount.state().poster, None);
    }
}
