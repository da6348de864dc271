//! The REST client for challenge accept/decline and friend request accept.
//! Named as an out-of-scope external collaborator by the purpose
//! statement; kept thin, wired against `reqwest` like the rest of this
//! crate's ambient stack.

use protocol::wire::{ChallengeDeclineRequest, FriendInvitationRequest};

use crate::error::Error;

pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
    apikey: String,
}

impl RestClient {
    pub fn new(base_url: String, apikey: String) -> Self {
        Self { http: reqwest::Client::new(), base_url, apikey }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    pub async fn accept_challenge(&self, challenge_id: u64) -> Result<(), Error> {
        self.http
            .post(self.url(&format!("me/challenges/{challenge_id}/accept")))
            .header("authorization", format!("Bearer {}", self.apikey))
            .json(&serde_json::json!({}))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    pub async fn decline_challenge(&self, challenge_id: u64, decline: &ChallengeDeclineRequest) -> Result<(), Error> {
        self.http
            .post(self.url(&format!("me/challenges/{challenge_id}")))
            .header("authorization", format!("Bearer {}", self.apikey))
            .json(decline)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    pub async fn accept_friend_request(&self, from_user: u64) -> Result<(), Error> {
        self.http
            .post(self.url("me/friends/invitations"))
            .header("authorization", format!("Bearer {}", self.apikey))
            .json(&FriendInvitationRequest { from_user })
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
