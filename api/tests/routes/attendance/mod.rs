mod post_test;
mod put_test;
