pub mod captain_dto;
pub mod draft_dto;
pub mod message_dto;
pub mod player_dto;
