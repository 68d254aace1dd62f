mod binder_tests;
