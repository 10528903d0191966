mod comments;
mod likes;
mod posts;
mod subscriptions;
mod users;
