mod illustration_repo;

pub use illustration_repo::DieselIllustrationRepository;
