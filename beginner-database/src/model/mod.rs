pub mod kudos;
