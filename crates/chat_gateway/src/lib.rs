pub mod command;
pub mod gateway;
pub mod interaction;
pub mod message;
pub mod responder;

#[cfg(any(test, feature = "test-utils"))]
pub mod gateway_test_util;

pub use command::{CommandMeta, SubcommandMeta};
pub use gateway::{
    ChatGateway, GatewayError, InteractionResponse, InteractionSink, MessageRange,
};
pub use interaction::{
    ButtonInteraction, CommandInteraction, Interaction, InteractionBase, InteractionKind,
    ModalSubmitInteraction,
};
pub use message::{
    Button, ButtonStyle, ChannelInfo, ChatMessage, Component, MessagePayload, Modal, Permissions,
    TextInput, TextInputStyle,
};
pub use responder::InteractionResponder;
